use std::sync::Arc;

use anyhow::Context;
use prodsearch_core::{Embedding, IntentSearch, ProductSearch, RetryPolicy, Retrying};
use prodsearch_embeddings::{OpenAiEmbedding, OpenAiEmbeddingConfig};
use prodsearch_qdrant::{QdrantIntentSearch, QdrantProductSearch};
use prodsearch_server::{app_router, serve, shutdown_signal, storefront, AppState, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let qdrant = Arc::new(QdrantProductSearch::from_env().context("invalid qdrant configuration")?);

    match qdrant.verify_collection().await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("continuing without the configured collection"),
        Err(_) => tracing::warn!("qdrant is unreachable at startup; continuing"),
    }

    let embedder = OpenAiEmbedding::new(
        OpenAiEmbeddingConfig::from_env().context("invalid embedding configuration")?,
    );
    let embedder: Arc<dyn Embedding> = Arc::new(Retrying::new(embedder, RetryPolicy::default()));

    let fallback = match &config.fallback_products_path {
        Some(path) => storefront::load_catalogue(path)?,
        None => Vec::new(),
    };
    tracing::info!(fallback_products = fallback.len(), "fallback catalogue loaded");

    let intents = QdrantIntentSearch::from_env()
        .context("invalid intent collection configuration")?
        .map(Arc::new);
    match &intents {
        Some(intents) => match intents.verify_collection().await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("continuing without the intent collection"),
            Err(_) => tracing::warn!("intent qdrant is unreachable at startup; continuing"),
        },
        None => tracing::info!("intent classification disabled; no intent collection configured"),
    }

    let search: Arc<dyn ProductSearch> = qdrant.clone();
    let mut state = AppState::new(search, embedder).with_fallback(fallback);
    if let Some(intents) = &intents {
        let intents: Arc<dyn IntentSearch> = intents.clone();
        state = state.with_intents(intents);
    }
    let app = app_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    serve(listener, app, shutdown_signal()).await?;

    match Arc::try_unwrap(qdrant) {
        Ok(qdrant) => qdrant.close(),
        Err(_) => tracing::warn!("qdrant adapter still shared at shutdown; skipping close"),
    }
    if let Some(intents) = intents {
        match Arc::try_unwrap(intents) {
            Ok(intents) => intents.close(),
            Err(_) => tracing::warn!("intent adapter still shared at shutdown; skipping close"),
        }
    }

    Ok(())
}
