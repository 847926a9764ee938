use crate::content::{ContentRecord, Field, Overrides, SourceFields, StatusMap, TranslationStatus};
use crate::i18n::Language;
use crate::store::ContentStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

const FAQ_COLUMNS: &str =
    "id, question, answer, translations, translation_status, is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct FaqRow {
    id: i64,
    question: String,
    answer: String,
    translations: Json<Overrides>,
    translation_status: Json<StatusMap>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FaqRow> for ContentRecord {
    fn from(row: FaqRow) -> Self {
        ContentRecord {
            id: row.id,
            source: SourceFields::new(row.question, row.answer),
            overrides: row.translations.0,
            translation_status: row.translation_status.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// FAQ store on PostgreSQL. Per-language translations and status live in
/// JSONB columns keyed by language code.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the faqs table and its listing index (idempotent)
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS faqs (
                id BIGSERIAL PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                translations JSONB NOT NULL DEFAULT '{}'::jsonb,
                translation_status JSONB NOT NULL DEFAULT '{}'::jsonb,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create faqs table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_faqs_active_created ON faqs (is_active, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create faqs index")?;

        info!("✓ Database schema ready");
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn get(&self, id: i64) -> Result<Option<ContentRecord>> {
        let row: Option<FaqRow> =
            sqlx::query_as(&format!("SELECT {} FROM faqs WHERE id = $1", FAQ_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to load FAQ {}", id))?;

        Ok(row.map(ContentRecord::from))
    }

    async fn insert(&self, source: &SourceFields) -> Result<ContentRecord> {
        let row: FaqRow = sqlx::query_as(&format!(
            "INSERT INTO faqs (question, answer) VALUES ($1, $2) RETURNING {}",
            FAQ_COLUMNS
        ))
        .bind(&source.question)
        .bind(&source.answer)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert FAQ")?;

        Ok(row.into())
    }

    async fn update_source(&self, id: i64, source: &SourceFields) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE faqs
             SET question = $2, answer = $3, translations = '{}'::jsonb, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&source.question)
        .bind(&source.answer)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update FAQ {}", id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_override(
        &self,
        id: i64,
        field: Field,
        language: Language,
        translated_from: &str,
        value: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE faqs
             SET translations = jsonb_set(
                     translations,
                     ARRAY[$2::text],
                     COALESCE(translations -> $2::text, '{}'::jsonb) || jsonb_build_object($3::text, $4::text),
                     true
                 ),
                 updated_at = NOW()
             WHERE id = $1
               AND (CASE $3::text WHEN 'question' THEN question ELSE answer END) = $5",
        )
        .bind(id)
        .bind(language.code())
        .bind(field.as_str())
        .bind(value)
        .bind(translated_from)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to store {} translation for FAQ {}", language, id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: i64,
        language: Language,
        status: &TranslationStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE faqs
             SET translation_status = translation_status || jsonb_build_object($2::text, $3::jsonb),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(language.code())
        .bind(Json(status))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to store {} status for FAQ {}", language, id))?;

        if result.rows_affected() == 0 {
            bail!("FAQ {} not found", id);
        }
        Ok(())
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE faqs SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to change visibility of FAQ {}", id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_active(&self) -> Result<Vec<ContentRecord>> {
        let rows: Vec<FaqRow> = sqlx::query_as(&format!(
            "SELECT {} FROM faqs WHERE is_active = TRUE ORDER BY created_at DESC, id DESC",
            FAQ_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list FAQs")?;

        Ok(rows.into_iter().map(ContentRecord::from).collect())
    }
}
