// src/feed.rs
//! Shared feed snapshot. The refresh task publishes a new article list and
//! every summary is recomputed from scratch on that publish; there is no
//! incremental update or caching, a fresh list simply replaces the old one.
//! A failed refresh records a human-readable message and keeps the stale
//! articles in place so the client still has something to show.

use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use metrics::counter;
use serde::Serialize;

use crate::fetch::types::Article;
use crate::summary::{ArticleSummary, Summarizer};

#[derive(Debug, Default)]
struct Snapshot {
    articles: Vec<Article>,
    summaries: Vec<ArticleSummary>,
    refreshed_at: u64,
    last_error: Option<String>,
}

/// Thread-safe holder of the current feed. Readers get cloned vectors, never
/// references into the lock.
#[derive(Debug, Default)]
pub struct Feed {
    inner: RwLock<Snapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedStatus {
    pub articles: usize,
    pub refreshed_at: u64,
    pub last_error: Option<String>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the article list and rebuild every summary from it.
    pub fn publish(&self, articles: Vec<Article>, summarizer: &Summarizer) {
        let summaries: Vec<ArticleSummary> =
            articles.iter().map(|a| summarizer.summarize(a)).collect();
        let predictive = summaries.iter().filter(|s| s.is_predictive).count();
        counter!("analytics_summaries_total").increment(summaries.len() as u64);
        counter!("analytics_predictive_total").increment(predictive as u64);

        let mut guard = self.inner.write().expect("feed lock poisoned");
        guard.articles = articles;
        guard.summaries = summaries;
        guard.refreshed_at = now_unix();
        guard.last_error = None;
    }

    /// Record a refresh failure. Stale articles and summaries stay readable.
    pub fn publish_error(&self, message: String) {
        let mut guard = self.inner.write().expect("feed lock poisoned");
        guard.last_error = Some(message);
    }

    pub fn articles(&self) -> Vec<Article> {
        self.inner.read().expect("feed lock poisoned").articles.clone()
    }

    pub fn summaries(&self) -> Vec<ArticleSummary> {
        self.inner.read().expect("feed lock poisoned").summaries.clone()
    }

    pub fn status(&self) -> FeedStatus {
        let guard = self.inner.read().expect("feed lock poisoned");
        FeedStatus {
            articles: guard.articles.len(),
            refreshed_at: guard.refreshed_at,
            last_error: guard.last_error.clone(),
        }
    }
}

/// Case-insensitive title/description search. A blank query keeps everything.
pub fn filter_by_query<'a>(articles: &'a [Article], query: &str) -> Vec<&'a Article> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return articles.iter().collect();
    }
    articles
        .iter()
        .filter(|a| {
            a.title.to_lowercase().contains(&q)
                || a.description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&q))
                    .unwrap_or(false)
        })
        .collect()
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, title: &str, description: Option<&str>) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            source_name: "BBC News".to_string(),
            url_to_image: None,
            published_at: 0,
        }
    }

    #[test]
    fn publish_rebuilds_summaries_and_clears_error() {
        let feed = Feed::new();
        let s = Summarizer::default();

        feed.publish_error("boom".to_string());
        assert_eq!(feed.status().last_error.as_deref(), Some("boom"));

        feed.publish(vec![article("u1", "Rates will rise", None)], &s);
        let status = feed.status();
        assert_eq!(status.articles, 1);
        assert!(status.last_error.is_none());
        assert!(status.refreshed_at > 0);

        let summaries = feed.summaries();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].is_predictive);
    }

    #[test]
    fn publish_error_keeps_stale_articles() {
        let feed = Feed::new();
        let s = Summarizer::default();
        feed.publish(vec![article("u1", "Parliament votes today", None)], &s);

        feed.publish_error("refresh failed".to_string());
        assert_eq!(feed.articles().len(), 1);
        assert_eq!(feed.summaries().len(), 1);
        assert_eq!(feed.status().last_error.as_deref(), Some("refresh failed"));
    }

    #[test]
    fn query_filter_is_case_insensitive_over_title_and_description() {
        let list = vec![
            article("u1", "Oil prices surge", None),
            article("u2", "Quiet day", Some("Energy markets drift")),
            article("u3", "Football final", None),
        ];
        let hits = filter_by_query(&list, "ENERGY");
        let ids: Vec<&str> = hits.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["u2"]);

        assert_eq!(filter_by_query(&list, "  ").len(), 3);
    }
}
