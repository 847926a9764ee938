//! Translation metrics and observability module.
//!
//! Counters for how translated reads were served: from a stored override,
//! from the cache, or by calling the provider (and how often that failed
//! badly enough to fall back to the source text).

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Translation counters, owned by one orchestrator.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Reads answered from a stored per-language override
    override_hits: AtomicUsize,

    /// Reads answered from the translation cache
    cache_hits: AtomicUsize,

    /// Reads that found neither an override nor a cache entry
    cache_misses: AtomicUsize,

    /// Individual provider attempts (retries count separately)
    provider_calls: AtomicUsize,

    /// Provider attempts that errored or timed out
    provider_failures: AtomicUsize,

    /// Reads that exhausted the retry budget and returned source text
    fallbacks: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_override_hit(&self) {
        self.override_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a provider call that is a failure unless `succeeded` is called.
    /// Dropping the guard mid-call (a timed-out attempt) counts as a failure.
    pub fn start_provider_attempt(&self) -> ProviderAttempt<'_> {
        self.record_provider_call();
        ProviderAttempt {
            metrics: self,
            succeeded: false,
        }
    }

    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn override_hits(&self) -> usize {
        self.override_hits.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let override_hits = self.override_hits();
        let cache_hits = self.cache_hits();
        let misses = self.cache_misses();
        let hits = override_hits + cache_hits;
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 {
            (hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.provider_calls();
        let failures = self.provider_failures();
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            override_hits,
            cache_hits,
            cache_misses: misses,
            hit_rate,
            provider_calls: calls,
            provider_failures: failures,
            provider_success_rate,
            fallbacks: self.fallbacks(),
        }
    }
}

/// One in-flight provider call, see `TranslationMetrics::start_provider_attempt`.
pub struct ProviderAttempt<'a> {
    metrics: &'a TranslationMetrics,
    succeeded: bool,
}

impl ProviderAttempt<'_> {
    pub fn succeeded(mut self) {
        self.succeeded = true;
    }
}

impl Drop for ProviderAttempt<'_> {
    fn drop(&mut self) {
        if !self.succeeded {
            self.metrics.record_provider_failure();
        }
    }
}

/// Point-in-time snapshot of the translation counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub override_hits: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Share of lookups served without the provider, as a percentage (0-100)
    pub hit_rate: f64,

    pub provider_calls: usize,
    pub provider_failures: usize,

    /// Provider attempt success rate as a percentage (0-100)
    pub provider_success_rate: f64,

    pub fallbacks: usize,
}
