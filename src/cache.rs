//! Short-lived memoization of translated strings.
//!
//! The cache sits in front of the overrides stored on each record and only
//! ever mirrors them, so losing it costs latency, never correctness.
//!
//! Keys carry a digest of the source text they were translated from. A
//! translation of text that has since been edited sits under a key no
//! current reader computes, so it can never be served as a hit.

use crate::content::{ContentRecord, Field, SourceFields};
use crate::error::CacheError;
use crate::i18n::Language;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Identifies one cached translation: `(record, field, language)` of one
/// version of the field's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub record_id: i64,
    pub field: Field,
    pub language: Language,
    pub source_tag: u64,
}

impl CacheKey {
    pub fn new(record_id: i64, field: Field, language: Language, source_text: &str) -> Self {
        Self {
            record_id,
            field,
            language,
            source_tag: source_tag(source_text),
        }
    }

    /// Key for the record's current source text.
    pub fn for_record(record: &ContentRecord, field: Field, language: Language) -> Self {
        Self::new(record.id, field, language, record.source.get(field))
    }
}

/// First 8 bytes of the SHA-256 of the source text.
fn source_tag(source_text: &str) -> u64 {
    let digest = Sha256::digest(source_text.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Renders as the opaque store key, e.g. `faq_42_answer_hi_9f86d081884c7d65`.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "faq_{}_{}_{}_{:016x}",
            self.record_id,
            self.field.as_str(),
            self.language.code(),
            self.source_tag
        )
    }
}

/// Expiry policy: two TTL classes and the fields that get the long one.
#[derive(Debug, Clone, PartialEq)]
pub struct CachePolicy {
    pub short_ttl: Duration,
    pub long_ttl: Duration,
    pub long_fields: Vec<Field>,
}

impl CachePolicy {
    /// Long TTL applies to the answer (rich text), short TTL to everything else.
    pub fn new(short_ttl: Duration, long_ttl: Duration) -> Self {
        Self {
            short_ttl,
            long_ttl,
            long_fields: vec![Field::Answer],
        }
    }

    pub fn with_long_fields(mut self, fields: Vec<Field>) -> Self {
        self.long_fields = fields;
        self
    }

    pub fn ttl_for(&self, field: Field) -> Duration {
        if self.long_fields.contains(&field) {
            self.long_ttl
        } else {
            self.short_ttl
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60), Duration::from_secs(60 * 60))
    }
}

/// TTL key-value store for translated strings.
///
/// `get` must report presence explicitly: `Some("")` is a cached empty
/// translation, `None` is a miss.
#[async_trait]
pub trait TranslationCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError>;

    /// Drop every `(field, language)` entry of one record's source text.
    async fn invalidate_all(
        &self,
        record_id: i64,
        source: &SourceFields,
        languages: &[Language],
    ) -> Result<(), CacheError> {
        for language in languages {
            for field in Field::ALL {
                let key = CacheKey::new(record_id, field, *language, source.get(field));
                self.delete(&key).await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache. Expired entries are dropped when next read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError("memory cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl TranslationCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let key = key.to_string();
        let mut entries = self.lock()?;

        let expired = match entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()))
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("Cache entry {} expired", key);
            entries.remove(&key);
        }
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.lock()?.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.lock()?.remove(&key.to_string());
        Ok(())
    }
}
