use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use moctail_api::{
    api::{cors_layer, create_router, AppState},
    config::Config,
    corpus::{ArtifactProvider, CorpusCell, HttpArtifacts, LocalArtifacts},
    db::{create_pool, create_redis_client, run_migrations, Cache, CacheWriterHandle, PgSearchHistory},
    services::{InMemorySearchHistory, SearchHistory},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moctail_api=info,tower_http=info")),
        )
        .init();

    let history = build_history(&config).await?;
    let cache = build_cache(&config).await;

    let provider: Box<dyn ArtifactProvider> = match &config.artifact_base_url {
        Some(base_url) => Box::new(HttpArtifacts::new(base_url.clone(), config.artifact_dir.clone())),
        None => Box::new(LocalArtifacts::new(config.artifact_dir.clone())),
    };

    let corpus = CorpusCell::new()
        .get_or_load(provider.as_ref(), &config.corpus_files())
        .await
        .context("Failed to load corpus")?;

    let mut state = AppState::new(corpus, history);
    let mut writer: Option<CacheWriterHandle> = None;
    if let Some((cache, handle)) = cache {
        state = state.with_cache(cache, config.recommend_cache_ttl);
        writer = Some(handle);
    }

    let allowed_origins = config.allowed_origins();
    let app = create_router(state, cors_layer(allowed_origins.as_deref()));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = writer {
        writer.shutdown().await;
    }

    Ok(())
}

async fn build_history(config: &Config) -> anyhow::Result<Arc<dyn SearchHistory>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await.context("Failed to connect to PostgreSQL")?;
            run_migrations(&pool).await.context("Failed to run migrations")?;
            tracing::info!("Search history backed by PostgreSQL");
            Ok(Arc::new(PgSearchHistory::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, search history kept in memory");
            Ok(Arc::new(InMemorySearchHistory::new()))
        }
    }
}

/// The response cache is optional; a bad Redis URL only disables it
async fn build_cache(config: &Config) -> Option<(Cache, CacheWriterHandle)> {
    let url = config.redis_url.as_deref()?;
    match create_redis_client(url) {
        Ok(client) => {
            tracing::info!("Recommendation cache enabled");
            Some(Cache::new(client).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invalid REDIS_URL, caching disabled");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
