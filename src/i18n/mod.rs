//! Supported languages and translation observability.
//!
//! - `registry`: the closed set of supported languages and which one is the source
//! - `language`: validated `Language` handle built from a registry entry
//! - `metrics`: per-orchestrator counters for overrides, cache and provider use
//!
//! # Example
//!
//! ```rust,ignore
//! use faq_translations::i18n::{Language, LanguageRegistry};
//!
//! let source = Language::canonical();
//! let hindi = Language::from_code("hi")?;
//! let targets = Language::translation_targets();
//! ```

mod language;
mod metrics;
mod registry;

pub use language::Language;
pub use metrics::{MetricsReport, ProviderAttempt, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
