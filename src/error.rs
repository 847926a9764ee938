use crate::retry::AttemptTimeout;
use std::time::Duration;

/// Errors that cross the boundary of the translation core.
///
/// Only usage and validation problems (plus store outages on a required
/// read or write) surface here. Translation failures are absorbed by the
/// orchestrator and show up as a `Failed` status instead.
#[derive(Debug, thiserror::Error)]
pub enum FaqError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Language {0} is not supported")]
    UnsupportedLanguage(String),

    #[error("FAQ {0} not found")]
    NotFound(i64),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type FaqResult<T> = Result<T, FaqError>;

/// Rejected source content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} field is required")]
    MissingField(&'static str),

    #[error("{field} must be at least {min} characters long")]
    TooShort { field: &'static str, min: usize },
}

/// A single failed call to the translation backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("translation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("translation API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("translation request failed: {0}")]
    Request(String),

    #[error("translation response contained no text")]
    EmptyResponse,
}

impl From<AttemptTimeout> for ProviderError {
    fn from(timeout: AttemptTimeout) -> Self {
        ProviderError::Timeout(timeout.0)
    }
}

/// The retry budget for one translation ran out.
#[derive(Debug, Clone, thiserror::Error)]
#[error("translation failed after {attempts} attempts: {last_error}")]
pub struct TranslationFailure {
    pub attempts: u32,
    pub last_error: ProviderError,
}

/// The cache backend could not serve a request. Always treated as a miss.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cache unavailable: {0}")]
pub struct CacheError(pub String);
