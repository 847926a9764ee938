//! Translation orchestration: resolving translated fields through stored
//! overrides, the cache and the provider, plus the write-side hooks that keep
//! them honest (invalidation on edit, pre-warm on create).
//!
//! Read path for `(record, field, language)`:
//!
//! ```text
//! source language ──► source text
//! override (non-empty) ──► value (and re-cache it)
//! cache hit (even "") ──► value
//! provider, with retry ──► store override + status, cache, value
//!                     └─► exhausted: status = failed, source text
//! ```
//!
//! Cache keys carry a digest of the source text they were translated from, so
//! a reader holding an outdated record can only ever write under a key that
//! current readers never look up.

use crate::cache::{CacheKey, CachePolicy, TranslationCache};
use crate::content::{ContentRecord, Field, SourceFields, StatusMap, TranslationStatus};
use crate::error::{FaqError, FaqResult, ProviderError, TranslationFailure};
use crate::i18n::{Language, TranslationMetrics};
use crate::provider::TranslationProvider;
use crate::retry::{with_retry, RetryConfig};
use crate::store::ContentStore;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How creation warms up translations for the new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrewarmMode {
    /// Translate before `create_content` returns.
    Inline,
    /// Translate on a spawned task; `create_content` returns right away.
    Background,
}

/// FAQs localized at once by `list_localized`.
const LIST_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct TranslationPolicy {
    /// Attempt budget, inter-attempt delay and per-attempt timeout.
    /// A `max_attempts` of 0 is raised to 1.
    pub retry: RetryConfig,
    pub cache: CachePolicy,
    pub prewarm: PrewarmMode,
}

impl Default for TranslationPolicy {
    fn default() -> Self {
        Self {
            retry: RetryConfig::translation(),
            cache: CachePolicy::default(),
            prewarm: PrewarmMode::Inline,
        }
    }
}

/// A FAQ rendered in one language.
#[derive(Debug, Clone, Serialize)]
pub struct LocalizedContent {
    pub id: i64,
    pub language: Language,
    pub question: String,
    pub answer: String,
    pub translations_available: BTreeMap<String, bool>,
    pub translation_status: StatusMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolves translated FAQ fields and keeps cache and overrides in step with edits.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct TranslationOrchestrator {
    store: Arc<dyn ContentStore>,
    cache: Arc<dyn TranslationCache>,
    provider: Arc<dyn TranslationProvider>,
    policy: Arc<TranslationPolicy>,
    metrics: Arc<TranslationMetrics>,
}

impl TranslationOrchestrator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        cache: Arc<dyn TranslationCache>,
        provider: Arc<dyn TranslationProvider>,
        mut policy: TranslationPolicy,
    ) -> Self {
        policy.retry.max_attempts = policy.retry.attempts();
        Self {
            store,
            cache,
            provider,
            policy: Arc::new(policy),
            metrics: Arc::new(TranslationMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    pub fn policy(&self) -> &TranslationPolicy {
        &self.policy
    }

    // ==================== Read path ====================

    /// Resolve one field of a stored FAQ in the language with the given code.
    ///
    /// Fails only for an unsupported language (checked first), an unknown id
    /// or a store outage while loading. Translation trouble degrades to the
    /// source text.
    pub async fn resolve(&self, id: i64, field: Field, language_code: &str) -> FaqResult<String> {
        let language = Language::from_code(language_code)?;
        let mut record = self.load(id).await?;
        Ok(self.resolve_field(&mut record, field, language).await)
    }

    /// Resolve `field` of `record` in `language`, updating the record in place
    /// when a fresh translation or status is produced.
    pub async fn resolve_field(
        &self,
        record: &mut ContentRecord,
        field: Field,
        language: Language,
    ) -> String {
        if language.is_canonical() {
            return record.source.get(field).to_string();
        }

        let key = CacheKey::for_record(record, field, language);

        if let Some(value) = record.override_for(field, language) {
            let value = value.to_string();
            self.metrics.record_override_hit();
            self.cache_put(&key, &value).await;
            return value;
        }

        match self.cache.get(&key).await {
            Ok(Some(value)) => {
                debug!("Cache hit for {}", key);
                self.metrics.record_cache_hit();
                return value;
            }
            Ok(None) => {}
            Err(e) => warn!("Cache lookup for {} failed, treating as miss: {}", key, e),
        }

        self.metrics.record_cache_miss();
        self.fetch_translation(record, field, language).await
    }

    /// Call the provider with the configured retry budget and per-attempt timeout.
    ///
    /// A blank reply is a failed attempt like any provider error.
    pub async fn translate_with_retry(
        &self,
        text: &str,
        language: Language,
    ) -> Result<String, TranslationFailure> {
        let provider = &self.provider;
        let metrics = &self.metrics;

        with_retry(
            &self.policy.retry,
            &format!("Translation to {}", language.name()),
            || async move {
                let attempt = metrics.start_provider_attempt();
                let translated = provider.translate(text, language).await?;
                if translated.trim().is_empty() {
                    return Err(ProviderError::EmptyResponse);
                }
                attempt.succeeded();
                Ok(translated)
            },
        )
        .await
        .map_err(|last_error| TranslationFailure {
            attempts: self.policy.retry.attempts(),
            last_error,
        })
    }

    /// Translate from source, bypassing override and cache, and write the
    /// outcome back. Returns the translation, or the source text on failure.
    async fn fetch_translation(
        &self,
        record: &mut ContentRecord,
        field: Field,
        language: Language,
    ) -> String {
        let source_text = record.source.get(field).to_string();

        match self.translate_with_retry(&source_text, language).await {
            Ok(translated) => {
                let status = TranslationStatus::success();
                record.overrides.set(field, language, translated.as_str());
                record
                    .translation_status
                    .insert(language.code().to_string(), status.clone());
                record.touch();

                match self
                    .store
                    .set_override(record.id, field, language, &source_text, &translated)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => debug!(
                        "FAQ {} {} changed while translating to {}, result not stored",
                        record.id, field, language
                    ),
                    Err(e) => warn!(
                        "Failed to store {} {} translation for FAQ {}: {:#}",
                        language, field, record.id, e
                    ),
                }
                self.save_status(record.id, language, &status).await;
                let key = CacheKey::new(record.id, field, language, &source_text);
                self.cache_put(&key, &translated).await;

                translated
            }
            Err(failure) => {
                error!(
                    "Translation error for FAQ {} ({} -> {}): {}",
                    record.id, field, language, failure
                );
                self.metrics.record_fallback();

                let status = TranslationStatus::failed(&failure);
                record
                    .translation_status
                    .insert(language.code().to_string(), status.clone());
                record.touch();
                self.save_status(record.id, language, &status).await;

                source_text
            }
        }
    }

    // ==================== Write path ====================

    /// Validate and store a new FAQ, then pre-warm every target language.
    ///
    /// Succeeds whenever validation and the insert succeed; translation
    /// failures during pre-warm only show up in the status map.
    pub async fn create_content(&self, source: SourceFields) -> FaqResult<i64> {
        source.validate()?;
        let record = self.store.insert(&source).await?;
        let id = record.id;
        info!("Created FAQ {}", id);

        match self.policy.prewarm {
            PrewarmMode::Inline => {
                self.prewarm(record).await;
            }
            PrewarmMode::Background => {
                let this = self.clone();
                tokio::spawn(async move {
                    this.prewarm(record).await;
                });
            }
        }

        Ok(id)
    }

    /// Replace the source text of an existing FAQ.
    ///
    /// The cache is invalidated before the new text is written, and the
    /// stored translations of the old text are dropped with it, so the next
    /// read translates the new source.
    pub async fn update_content(&self, id: i64, source: SourceFields) -> FaqResult<()> {
        source.validate()?;
        let current = self.load(id).await?;

        self.invalidate_record(&current).await;

        if !self.store.update_source(id, &source).await? {
            return Err(FaqError::NotFound(id));
        }
        info!("Updated FAQ {}", id);
        Ok(())
    }

    /// Drop every cached translation of a record. Stored overrides stay
    /// readable until a fresh translation replaces them.
    pub async fn invalidate(&self, id: i64) {
        match self.store.get(id).await {
            Ok(Some(record)) => self.invalidate_record(&record).await,
            Ok(None) => debug!("FAQ {} is gone, nothing to invalidate", id),
            Err(e) => error!("Failed to load FAQ {} for invalidation: {:#}", id, e),
        }
    }

    async fn invalidate_record(&self, record: &ContentRecord) {
        if let Err(e) = self
            .cache
            .invalidate_all(record.id, &record.source, &Language::all_enabled())
            .await
        {
            error!(
                "Failed to invalidate cached translations for FAQ {}: {}",
                record.id, e
            );
        }
    }

    /// Re-translate both fields into every target language, replacing stored
    /// overrides on success. Failed languages keep their previous override.
    pub async fn refresh_translations(&self, id: i64) -> FaqResult<StatusMap> {
        let mut record = self.load_active(id).await?;
        self.invalidate_record(&record).await;

        for language in Language::translation_targets() {
            for field in Field::ALL {
                self.fetch_translation(&mut record, field, language).await;
            }
        }

        info!("Refreshed translations for FAQ {}", id);
        Ok(record.translation_status)
    }

    /// Hide a FAQ from listings.
    pub async fn deactivate(&self, id: i64) -> FaqResult<()> {
        if !self.store.set_active(id, false).await? {
            return Err(FaqError::NotFound(id));
        }
        self.invalidate(id).await;
        info!("Deactivated FAQ {}", id);
        Ok(())
    }

    async fn prewarm(&self, mut record: ContentRecord) {
        for language in Language::translation_targets() {
            for field in Field::ALL {
                self.resolve_field(&mut record, field, language).await;
            }
            match record.status_for(language) {
                Some(status) if !status.is_success() => warn!(
                    "Initial translation failed for FAQ {} in {}",
                    record.id,
                    language.name()
                ),
                _ => debug!("Pre-warmed FAQ {} in {}", record.id, language.name()),
            }
        }
    }

    // ==================== Localized views ====================

    pub async fn localize(&self, record: &mut ContentRecord, language: Language) -> LocalizedContent {
        let question = self.resolve_field(record, Field::Question, language).await;
        let answer = self.resolve_field(record, Field::Answer, language).await;

        LocalizedContent {
            id: record.id,
            language,
            question,
            answer,
            translations_available: record.translations_available(),
            translation_status: record.translation_status.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub async fn get_localized(&self, id: i64, language_code: &str) -> FaqResult<LocalizedContent> {
        let language = Language::from_code(language_code)?;
        let mut record = self.load_active(id).await?;
        Ok(self.localize(&mut record, language).await)
    }

    /// Active FAQs, newest first, in the requested language. At most
    /// `LIST_CONCURRENCY` of them are being translated at any time.
    pub async fn list_localized(&self, language_code: &str) -> FaqResult<Vec<LocalizedContent>> {
        let language = Language::from_code(language_code)?;
        let records = self.store.list_active().await?;

        Ok(stream::iter(records)
            .map(|mut record| async move { self.localize(&mut record, language).await })
            .buffered(LIST_CONCURRENCY)
            .collect()
            .await)
    }

    // ==================== Helpers ====================

    async fn load(&self, id: i64) -> FaqResult<ContentRecord> {
        self.store.get(id).await?.ok_or(FaqError::NotFound(id))
    }

    async fn load_active(&self, id: i64) -> FaqResult<ContentRecord> {
        match self.load(id).await? {
            record if record.is_active => Ok(record),
            _ => Err(FaqError::NotFound(id)),
        }
    }

    async fn cache_put(&self, key: &CacheKey, value: &str) {
        let ttl = self.policy.cache.ttl_for(key.field);
        if let Err(e) = self.cache.set(key, value, ttl).await {
            warn!("Failed to cache {}: {}", key, e);
        }
    }

    async fn save_status(&self, id: i64, language: Language, status: &TranslationStatus) {
        if let Err(e) = self.store.set_status(id, language, status).await {
            warn!(
                "Failed to record {} translation status for FAQ {}: {:#}",
                language, id, e
            );
        }
    }
}
