//! Headline Analyzer — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and the feed
//! refresh task.

use std::path::PathBuf;
use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tokio::sync::Notify;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use headline_analyzer::api::{self, AppState};
use headline_analyzer::feed::Feed;
use headline_analyzer::fetch::config as fetch_config;
use headline_analyzer::fetch::providers::{news_api::NewsApiProvider, rss::RssProvider};
use headline_analyzer::fetch::scheduler::{spawn_feed_scheduler, FeedSchedulerCfg};
use headline_analyzer::fetch::types::ArticleProvider;
use headline_analyzer::metrics::Metrics;
use headline_analyzer::prefs::PrefsStore;
use headline_analyzer::summary::Summarizer;
use headline_analyzer::topics::{
    start_hot_reload_thread, TopicCatalog, TopicCatalogHandle, DEFAULT_TOPICS_CONFIG_PATH,
    ENV_TOPICS_CONFIG_PATH,
};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FEED_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FEED_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("topics=info,fetch=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // NEWS_API_KEY / TOPICS_CONFIG_PATH etc. from .env.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let fetch_cfg = fetch_config::load_fetch_config_default();
    let metrics = Metrics::init(fetch_cfg.interval_secs);

    // --- Topic catalog + optional hot reload ---
    let topics = TopicCatalogHandle::new(TopicCatalog::load_default());
    let topics_path = std::env::var(ENV_TOPICS_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOPICS_CONFIG_PATH));
    start_hot_reload_thread(topics.clone(), topics_path);

    let summarizer = Arc::new(Summarizer::from_env());
    let feed = Arc::new(Feed::new());
    let prefs = Arc::new(PrefsStore::from_env());
    let refresh = Arc::new(Notify::new());

    // Without an API key the service still comes up, serving the bundled
    // offline feed instead of live headlines.
    let providers: Vec<Box<dyn ArticleProvider>> = match fetch_config::news_api_key_from_env() {
        Some(key) => vec![Box::new(NewsApiProvider::from_config(&fetch_cfg, key))],
        None => {
            tracing::warn!("NEWS_API_KEY not set; serving the bundled offline feed");
            vec![Box::new(RssProvider::from_fixture(
                "Al Jazeera English",
                include_str!("../tests/fixtures/world_rss.xml"),
            ))]
        }
    };

    let _scheduler = spawn_feed_scheduler(
        feed.clone(),
        summarizer.clone(),
        providers,
        refresh.clone(),
        FeedSchedulerCfg {
            interval_secs: fetch_cfg.interval_secs,
            similarity_threshold: fetch_cfg.similarity_threshold,
        },
    );

    let state = AppState {
        feed,
        summarizer,
        topics,
        prefs,
        refresh,
    };
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
