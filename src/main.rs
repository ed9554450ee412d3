use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use random_news::cache::FeedCache;
use random_news::config::Config;
use random_news::fetcher::{Fetcher, HttpFeedSource};
use random_news::news::NewsService;
use random_news::routes::{self, AppState};
use random_news::selector::Catalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "random_news=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("RANDOM_NEWS_CONFIG").unwrap_or_else(|_| "feeds.toml".to_string());
    let config = Config::load(&config_path)?;

    let catalog = Arc::new(Catalog::from_config(&config.categories));
    if catalog.is_empty() {
        warn!("No feed categories configured in {}", config_path);
    }
    info!(
        "Loaded {} feeds in {} categories from {}",
        catalog.source_count(),
        catalog.categories().len(),
        config_path
    );

    // Create fetcher
    let source = Arc::new(
        HttpFeedSource::new(config.fetch_timeout())?.with_max_bytes(config.max_feed_bytes),
    );
    let cache = FeedCache::new(config.cache_ttl(), config.cache_capacity);
    let fetcher = Fetcher::new(source, cache);

    // Create app state
    let news = Arc::new(NewsService::new(catalog, fetcher, config.items_per_feed));
    let state = Arc::new(AppState { news });

    // Build router
    let static_dir = std::env::var("RANDOM_NEWS_STATIC").unwrap_or_else(|_| "static".to_string());
    let app = routes::router(state, static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
