use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bikeshare_server::cache::SnapshotCache;
use bikeshare_server::config::ServerConfig;
use bikeshare_server::gbfs::{FeedClient, FeedSource, MockFeed};
use bikeshare_server::reconcile::Reconciler;
use bikeshare_server::scheduler::RefreshScheduler;
use bikeshare_server::web::{AppState, StatusEndpoint, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting bikeshare status server");
    tracing::info!("Poll interval: {}s", config.poll_interval.as_secs());
    if let Some(filter) = &config.station_filter {
        tracing::info!("Restricting to {} stations", filter.len());
    }

    match &config.mock_feed_dir {
        Some(dir) => {
            tracing::info!("Serving feed from {}", dir.display());
            serve(MockFeed::new(dir)?, &config).await
        }
        None => {
            tracing::info!("Polling feed at {}", config.feed.base_url);
            serve(FeedClient::new(config.feed.clone())?, &config).await
        }
    }
}

async fn serve<F: FeedSource>(
    feed: F,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let reconciler = match &config.station_filter {
        Some(ids) => Reconciler::new().with_station_filter(ids.iter().cloned()),
        None => Reconciler::new(),
    };

    let cache = Arc::new(SnapshotCache::new());
    let scheduler = RefreshScheduler::new(
        feed,
        reconciler,
        Arc::clone(&cache),
        config.poll_interval,
    );
    scheduler.spawn();

    let state = AppState::new(StatusEndpoint::new(cache), Arc::new(scheduler));
    let app = create_router(state, &config.artifacts_dir, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
