//! Durable record store seam.
//!
//! The orchestrator only needs point reads and field-level point updates;
//! `list_active` backs the listing endpoint.

use crate::content::{ContentRecord, Field, Overrides, SourceFields, TranslationStatus};
use crate::i18n::Language;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<ContentRecord>>;

    /// Persist a new record built from already-validated source text.
    async fn insert(&self, source: &SourceFields) -> Result<ContentRecord>;

    /// Replace the source text and drop the translations derived from the old
    /// text. Status entries are kept. Returns `false` if the record does not exist.
    async fn update_source(&self, id: i64, source: &SourceFields) -> Result<bool>;

    /// Store a translation of `translated_from`, unless the field's source
    /// text has changed since. Returns `false` if nothing was written because
    /// the source moved on or the record is gone.
    async fn set_override(
        &self,
        id: i64,
        field: Field,
        language: Language,
        translated_from: &str,
        value: &str,
    ) -> Result<bool>;

    async fn set_status(&self, id: i64, language: Language, status: &TranslationStatus)
        -> Result<()>;

    /// Returns `false` if the record does not exist.
    async fn set_active(&self, id: i64, active: bool) -> Result<bool>;

    /// Active records, newest first.
    async fn list_active(&self) -> Result<Vec<ContentRecord>>;
}

/// Store backed by a process-local map. Used when no database is configured.
#[derive(Debug)]
pub struct InMemoryStore {
    records: RwLock<HashMap<i64, ContentRecord>>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn get(&self, id: i64) -> Result<Option<ContentRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn insert(&self, source: &SourceFields) -> Result<ContentRecord> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = ContentRecord::new(id, source.clone());
        self.records.write().await.insert(id, record.clone());
        Ok(record)
    }

    async fn update_source(&self, id: i64, source: &SourceFields) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) => {
                record.source = source.clone();
                record.overrides = Overrides::default();
                record.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_override(
        &self,
        id: i64,
        field: Field,
        language: Language,
        translated_from: &str,
        value: &str,
    ) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) if record.source.get(field) == translated_from => {
                record.overrides.set(field, language, value);
                record.touch();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_status(
        &self,
        id: i64,
        language: Language,
        status: &TranslationStatus,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&id) else {
            bail!("FAQ {} not found", id);
        };
        record
            .translation_status
            .insert(language.code().to_string(), status.clone());
        record.touch();
        Ok(())
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) => {
                record.is_active = active;
                record.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_active(&self) -> Result<Vec<ContentRecord>> {
        let mut active: Vec<ContentRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(active)
    }
}
