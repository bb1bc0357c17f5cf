use std::sync::Arc;

use datecourse_api::{
    cache::{create_redis_client, Cache},
    config::Config,
    routes::{create_router, AppState},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "datecourse_api=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    if config.kakao_rest_api_key.is_none() {
        tracing::warn!("KAKAO_REST_API_KEY is not set, place and image search will fail");
    }

    let (cache, cache_handle) = match config.redis_url.as_deref() {
        Some(redis_url) => {
            let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
            tracing::info!("Search result caching enabled");
            (cache, Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, search result caching disabled");
            (Cache::disabled(), None)
        }
    };

    let state = AppState::from_config(&config, cache)?;
    let app = create_router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
