use anyhow::{Context, Result};
use faq_translations::api;
use faq_translations::cache::MemoryCache;
use faq_translations::config::Config;
use faq_translations::db::PgStore;
use faq_translations::orchestrator::TranslationOrchestrator;
use faq_translations::provider::OpenAiTranslator;
use faq_translations::store::{ContentStore, InMemoryStore};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("faq_translations=info".parse()?),
        )
        .init();

    info!("Starting FAQ translation service");

    let config = Config::from_env()?;

    let store: Arc<dyn ContentStore> = match &config.database_url {
        Some(url) => {
            info!("Using PostgreSQL store");
            Arc::new(PgStore::connect(url).await?)
        }
        None => {
            warn!("DATABASE_URL not set, FAQs will be kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    let orchestrator = TranslationOrchestrator::new(
        store,
        Arc::new(MemoryCache::new()),
        Arc::new(OpenAiTranslator::from_config(&config)),
        config.policy(),
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, api::router(orchestrator))
        .await
        .context("HTTP server error")?;

    Ok(())
}
