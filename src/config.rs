use crate::cache::CachePolicy;
use crate::orchestrator::{PrewarmMode, TranslationPolicy};
use crate::retry::RetryConfig;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Translation provider (OpenAI-compatible)
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,

    // Storage; in-memory when unset
    pub database_url: Option<String>,

    // Cache TTL classes
    pub cache_timeout_secs: u64,
    pub cache_timeout_long_secs: u64,

    // Retry policy
    pub translation_max_attempts: u32,
    pub translation_retry_delay_ms: u64,
    pub translation_timeout_secs: u64,

    pub prewarm_in_background: bool,

    // HTTP
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            openai_api_key: lookup("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?,
            openai_model: lookup("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            openai_api_url: lookup("OPENAI_API_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string()),

            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),

            cache_timeout_secs: parse_or(&lookup, "CACHE_TIMEOUT", 15 * 60),
            cache_timeout_long_secs: parse_or(&lookup, "CACHE_TIMEOUT_LONG", 60 * 60),

            translation_max_attempts: parse_or(&lookup, "TRANSLATION_MAX_ATTEMPTS", 3u32).max(1),
            translation_retry_delay_ms: parse_or(&lookup, "TRANSLATION_RETRY_DELAY_MS", 0),
            translation_timeout_secs: parse_or(&lookup, "TRANSLATION_TIMEOUT_SECS", 15),

            prewarm_in_background: parse_or(&lookup, "PREWARM_IN_BACKGROUND", false),

            port: parse_or(&lookup, "PORT", 8080),
        })
    }

    /// Translation policy for the orchestrator
    pub fn policy(&self) -> TranslationPolicy {
        TranslationPolicy {
            retry: RetryConfig::new(
                self.translation_max_attempts,
                Duration::from_millis(self.translation_retry_delay_ms),
            )
            .with_attempt_timeout(Duration::from_secs(self.translation_timeout_secs)),
            cache: CachePolicy::new(
                Duration::from_secs(self.cache_timeout_secs),
                Duration::from_secs(self.cache_timeout_long_secs),
            ),
            prewarm: if self.prewarm_in_background {
                PrewarmMode::Background
            } else {
                PrewarmMode::Inline
            },
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
