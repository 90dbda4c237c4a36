// src/fetch/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::feed::Feed;
use crate::fetch::types::ArticleProvider;
use crate::summary::Summarizer;

#[derive(Clone, Copy, Debug)]
pub struct FeedSchedulerCfg {
    pub interval_secs: u64,
    pub similarity_threshold: f64,
}

/// Spawn the feed refresh loop: one pass immediately, then every
/// `interval_secs`, plus whenever `refresh` is nudged (manual refresh).
/// A pass that yields nothing while providers errored publishes an error
/// message instead of wiping the stale list.
pub fn spawn_feed_scheduler(
    feed: Arc<Feed>,
    summarizer: Arc<Summarizer>,
    providers: Vec<Box<dyn ArticleProvider>>,
    refresh: Arc<Notify>,
    cfg: FeedSchedulerCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = refresh.notified() => {}
            }

            let (kept, filtered, dedup, errors) =
                crate::fetch::run_once(&providers, cfg.similarity_threshold).await;
            counter!("feed_refresh_total").increment(1);

            let kept_len = kept.len();
            if kept.is_empty() && errors > 0 {
                feed.publish_error(
                    "News refresh failed; showing the last loaded articles.".to_string(),
                );
            } else {
                feed.publish(kept, &summarizer);
            }

            tracing::info!(
                target: "fetch",
                kept = kept_len,
                filtered = filtered,
                dedup = dedup,
                errors = errors,
                "feed refresh tick"
            );
        }
    })
}
