//! Integration tests for the FAQ translation service
//!
//! These tests drive the orchestrator through its public API with an
//! in-memory store and cache and a scripted provider, covering the full
//! create / read / edit / refresh lifecycle. The PostgreSQL store is not
//! exercised here since it needs a live database.

use async_trait::async_trait;
use faq_translations::{
    cache::{CacheKey, MemoryCache, TranslationCache},
    content::{Field, Outcome, SourceFields},
    error::{FaqError, ProviderError},
    i18n::Language,
    orchestrator::{TranslationOrchestrator, TranslationPolicy},
    provider::{OpenAiTranslator, TranslationProvider},
    retry::RetryConfig,
    store::{ContentStore, InMemoryStore},
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

// ==================== Test Helpers ====================

/// Fails the first `fail_first` calls, then translates as `<code>:<text>`.
struct ScriptedProvider {
    fail_first: usize,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(fail_first: usize) -> Self {
        Self {
            fail_first,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for ScriptedProvider {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(ProviderError::Api {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        Ok(format!("{}:{}", target.code(), text))
    }
}

struct Service {
    orchestrator: TranslationOrchestrator,
    store: Arc<InMemoryStore>,
    cache: Arc<MemoryCache>,
    provider: Arc<ScriptedProvider>,
}

fn service(fail_first: usize, max_attempts: u32) -> Service {
    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let provider = Arc::new(ScriptedProvider::new(fail_first));
    let policy = TranslationPolicy {
        retry: RetryConfig::immediate(max_attempts),
        ..TranslationPolicy::default()
    };
    let orchestrator =
        TranslationOrchestrator::new(store.clone(), cache.clone(), provider.clone(), policy);
    Service {
        orchestrator,
        store,
        cache,
        provider,
    }
}

fn faq() -> SourceFields {
    SourceFields::new(
        "How do I reset my password?",
        "<p>Click <a href=\"/reset\">Forgot password</a> on the sign-in page.</p>",
    )
}

// ==================== Read path ====================

#[tokio::test]
async fn test_repeated_reads_hit_without_provider_calls() {
    let svc = service(0, 3);
    let record = svc.store.insert(&faq()).await.expect("insert");

    let first = svc
        .orchestrator
        .resolve(record.id, Field::Answer, "hi")
        .await
        .expect("resolve");
    let calls = svc.provider.calls();
    let second = svc
        .orchestrator
        .resolve(record.id, Field::Answer, "hi")
        .await
        .expect("resolve");

    assert_eq!(first, second);
    assert_eq!(svc.provider.calls(), calls);
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn test_cache_hit_skips_provider() {
    let svc = service(0, 3);
    let record = svc.store.insert(&faq()).await.expect("insert");
    let key = CacheKey::for_record(&record, Field::Question, Language::BENGALI);
    svc.cache
        .set(&key, "ক্যাশ থেকে", Duration::from_secs(60))
        .await
        .expect("set");

    let value = svc
        .orchestrator
        .resolve(record.id, Field::Question, "bn")
        .await
        .expect("resolve");

    assert_eq!(value, "ক্যাশ থেকে");
    assert_eq!(svc.provider.calls(), 0);
}

#[tokio::test]
async fn test_retry_bound_is_k_plus_one() {
    for k in 0..3 {
        let svc = service(k, 3);
        let record = svc.store.insert(&faq()).await.expect("insert");

        let value = svc
            .orchestrator
            .resolve(record.id, Field::Question, "hi")
            .await
            .expect("resolve");

        assert_eq!(value, format!("hi:{}", faq().question));
        assert_eq!(svc.provider.calls(), k + 1, "k = {}", k);
    }
}

#[tokio::test]
async fn test_exhaustion_returns_source_and_marks_failed() {
    let svc = service(usize::MAX, 3);
    let record = svc.store.insert(&faq()).await.expect("insert");

    let value = svc
        .orchestrator
        .resolve(record.id, Field::Answer, "bn")
        .await
        .expect("Translation failures never surface");

    assert_eq!(value, faq().answer);
    let stored = svc.store.get(record.id).await.expect("get").expect("exists");
    let status = stored.status_for(Language::BENGALI).expect("status");
    assert_eq!(status.outcome, Outcome::Failed);
    assert!(status
        .error
        .as_deref()
        .is_some_and(|e| e.contains("503")));
}

#[tokio::test]
async fn test_unsupported_language_makes_no_provider_calls() {
    let svc = service(0, 3);
    let record = svc.store.insert(&faq()).await.expect("insert");

    let err = svc
        .orchestrator
        .resolve(record.id, Field::Answer, "xx")
        .await
        .expect_err("Should reject");

    assert!(matches!(err, FaqError::UnsupportedLanguage(_)));
    assert_eq!(svc.provider.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_agree() {
    let svc = service(0, 3);
    let id = svc.store.insert(&faq()).await.expect("insert").id;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orchestrator = svc.orchestrator.clone();
            tokio::spawn(async move {
                orchestrator.resolve(id, Field::Question, "hi").await
            })
        })
        .collect();

    let expected = format!("hi:{}", faq().question);
    for handle in handles {
        let value = handle.await.expect("task").expect("resolve");
        assert_eq!(value, expected);
    }
    assert!(svc.provider.calls() >= 1);
}

// ==================== Write path ====================

#[tokio::test]
async fn test_create_validates_and_prewarms() {
    let svc = service(0, 3);

    let err = svc
        .orchestrator
        .create_content(SourceFields::new("", "A valid answer for the FAQ."))
        .await
        .expect_err("Should reject empty question");
    assert!(matches!(err, FaqError::Validation(_)));
    assert_eq!(svc.provider.calls(), 0);

    let id = svc
        .orchestrator
        .create_content(faq())
        .await
        .expect("Should create");

    let targets = Language::translation_targets();
    assert_eq!(svc.provider.calls(), targets.len() * Field::ALL.len());
    let record = svc.store.get(id).await.expect("get").expect("exists");
    for lang in targets {
        for field in Field::ALL {
            let key = CacheKey::for_record(&record, field, lang);
            assert!(svc.cache.get(&key).await.expect("get").is_some());
        }
    }
}

#[tokio::test]
async fn test_update_reflects_new_source() {
    let svc = service(0, 3);
    let id = svc.orchestrator.create_content(faq()).await.expect("create");
    let before = svc
        .orchestrator
        .resolve(id, Field::Question, "hi")
        .await
        .expect("resolve");
    assert_eq!(before, format!("hi:{}", faq().question));

    let edited = SourceFields::new(
        "How do I change my email address?",
        "Go to Settings and choose Account to edit your email.",
    );
    svc.orchestrator
        .update_content(id, edited.clone())
        .await
        .expect("update");

    for lang in Language::translation_targets() {
        for field in Field::ALL {
            let value = svc
                .orchestrator
                .resolve(id, field, lang.code())
                .await
                .expect("resolve");
            assert_eq!(value, format!("{}:{}", lang.code(), edited.get(field)));
        }
    }
}

#[tokio::test]
async fn test_refresh_then_listing() {
    let svc = service(0, 3);
    let id = svc.orchestrator.create_content(faq()).await.expect("create");

    let statuses = svc
        .orchestrator
        .refresh_translations(id)
        .await
        .expect("refresh");
    assert!(statuses.values().all(|s| s.outcome == Outcome::Success));

    let listed = svc.orchestrator.list_localized("hi").await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].answer, format!("hi:{}", faq().answer));

    svc.orchestrator.deactivate(id).await.expect("deactivate");
    assert!(svc
        .orchestrator
        .list_localized("hi")
        .await
        .expect("list")
        .is_empty());
}

// ==================== OpenAI provider end to end ====================

#[tokio::test]
async fn test_openai_outage_degrades_to_source() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit exceeded"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let orchestrator = TranslationOrchestrator::new(
        store.clone(),
        Arc::new(MemoryCache::new()),
        Arc::new(OpenAiTranslator::new(
            reqwest::Client::new(),
            format!("{}/v1/chat/completions", mock_server.uri()),
            "test-openai-key",
            "gpt-4o-mini",
        )),
        TranslationPolicy::default(),
    );
    let record = store.insert(&faq()).await.expect("insert");

    let value = orchestrator
        .resolve(record.id, Field::Question, "hi")
        .await
        .expect("resolve");

    assert_eq!(value, faq().question);
    let stored = store.get(record.id).await.expect("get").expect("exists");
    assert_eq!(
        stored.status_for(Language::HINDI).map(|s| s.outcome),
        Some(Outcome::Failed)
    );
}

#[tokio::test]
async fn test_openai_blank_reply_degrades_to_source() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "" } }]
        })))
        .expect(3)
        .mount(&mock_server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let orchestrator = TranslationOrchestrator::new(
        store.clone(),
        cache.clone(),
        Arc::new(OpenAiTranslator::new(
            reqwest::Client::new(),
            format!("{}/v1/chat/completions", mock_server.uri()),
            "test-openai-key",
            "gpt-4o-mini",
        )),
        TranslationPolicy::default(),
    );
    let record = store.insert(&faq()).await.expect("insert");

    let value = orchestrator
        .resolve(record.id, Field::Answer, "bn")
        .await
        .expect("resolve");

    assert_eq!(value, faq().answer);
    assert!(cache.is_empty());
    let stored = store.get(record.id).await.expect("get").expect("exists");
    assert_eq!(
        stored.status_for(Language::BENGALI).map(|s| s.outcome),
        Some(Outcome::Failed)
    );
    assert_eq!(stored.override_for(Field::Answer, Language::BENGALI), None);
}

// ==================== Edits racing reads ====================

#[tokio::test]
async fn test_read_from_before_an_edit_does_not_outlive_it() {
    let svc = service(0, 3);
    let id = svc.orchestrator.create_content(faq()).await.expect("create");
    let mut before_edit = svc.store.get(id).await.expect("get").expect("exists");

    let edited = SourceFields::new(
        "How do I change my email address?",
        "Go to Settings and choose Account to edit your email.",
    );
    svc.orchestrator
        .update_content(id, edited.clone())
        .await
        .expect("update");

    svc.orchestrator
        .resolve_field(&mut before_edit, Field::Question, Language::HINDI)
        .await;

    let value = svc
        .orchestrator
        .resolve(id, Field::Question, "hi")
        .await
        .expect("resolve");
    assert_eq!(value, format!("hi:{}", edited.question));
}

// ==================== Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A read in a supported target language returns either the translation
    /// or the exact source text, and never calls the provider more than the
    /// retry budget allows.
    #[test]
    fn prop_resolve_never_fails_for_supported_targets(
        fail_first in 0usize..6,
        max_attempts in 1u32..5,
        question in "[A-Za-z ?]{1,40}",
        answer in "[A-Za-z .,]{1,80}",
        bengali in any::<bool>(),
        answer_field in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");

        let language = if bengali { Language::BENGALI } else { Language::HINDI };
        let field = if answer_field { Field::Answer } else { Field::Question };
        let source = SourceFields::new(question, answer);

        let (value, calls) = runtime.block_on(async {
            let svc = service(fail_first, max_attempts);
            let record = svc.store.insert(&source).await.expect("insert");
            let value = svc
                .orchestrator
                .resolve(record.id, field, language.code())
                .await
                .expect("Reads in supported languages never fail");
            (value, svc.provider.calls())
        });

        let source_text = source.get(field).to_string();
        if fail_first < max_attempts as usize {
            prop_assert_eq!(value, format!("{}:{}", language.code(), source_text));
            prop_assert_eq!(calls, fail_first + 1);
        } else {
            prop_assert_eq!(value, source_text);
            prop_assert_eq!(calls, max_attempts as usize);
        }
    }
}
