// tests/feed_pipeline.rs
use anyhow::Result;
use async_trait::async_trait;

use headline_analyzer::feed::Feed;
use headline_analyzer::fetch::providers::news_api::NewsApiProvider;
use headline_analyzer::fetch::types::{Article, ArticleProvider};
use headline_analyzer::summary::Summarizer;

const NEWS_API_FIXTURE: &str = include_str!("fixtures/news_api_top.json");

struct MockProvider;

#[async_trait]
impl ArticleProvider for MockProvider {
    async fn fetch_latest(&self) -> Result<Vec<Article>> {
        Ok(vec![Article {
            id: "https://example.test/x".to_string(),
            title: "<b>Hello&nbsp;world</b> &ldquo;ok&rdquo;".to_string(),
            description: None,
            source_name: "Mock".to_string(),
            url_to_image: None,
            published_at: 1_000_000,
        }])
    }
    fn name(&self) -> &'static str {
        "MockProvider"
    }
}

struct FailingProvider;

#[async_trait]
impl ArticleProvider for FailingProvider {
    async fn fetch_latest(&self) -> Result<Vec<Article>> {
        anyhow::bail!("connection refused")
    }
    fn name(&self) -> &'static str {
        "FailingProvider"
    }
}

#[tokio::test]
async fn smoke_pipeline_normalizes_titles() {
    let providers: Vec<Box<dyn ArticleProvider>> = vec![Box::new(MockProvider)];
    let (kept, filtered, dedup, errors) = headline_analyzer::fetch::run_once(&providers, 0.9).await;
    assert_eq!(errors, 0);
    assert_eq!((filtered, dedup), (0, 0));
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].title, r#"Hello world "ok""#);
}

#[tokio::test]
async fn news_api_fixture_drops_the_syndicated_copy() {
    let providers: Vec<Box<dyn ArticleProvider>> = vec![Box::new(
        NewsApiProvider::from_fixture_str(NEWS_API_FIXTURE),
    )];
    let (kept, _, dedup, errors) = headline_analyzer::fetch::run_once(&providers, 0.9).await;
    assert_eq!(errors, 0);
    assert_eq!(dedup, 1, "near-duplicate syndicated headline must go");

    let ids: Vec<&str> = kept.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "https://news.test/markets/outlook",
            "https://news.test/business/oil-surge",
            "https://news.test/politics/education-bill",
        ],
        "provider order survives dedup"
    );
}

#[tokio::test]
async fn provider_failures_are_counted_not_fatal() {
    let providers: Vec<Box<dyn ArticleProvider>> = vec![
        Box::new(FailingProvider),
        Box::new(NewsApiProvider::from_fixture_str(NEWS_API_FIXTURE)),
    ];
    let (kept, _, _, errors) = headline_analyzer::fetch::run_once(&providers, 0.9).await;
    assert_eq!(errors, 1);
    assert_eq!(kept.len(), 3, "healthy provider still contributes");
}

#[tokio::test]
async fn published_feed_keeps_articles_and_summaries_aligned() {
    let providers: Vec<Box<dyn ArticleProvider>> = vec![Box::new(
        NewsApiProvider::from_fixture_str(NEWS_API_FIXTURE),
    )];
    let (kept, _, _, _) = headline_analyzer::fetch::run_once(&providers, 0.9).await;

    let feed = Feed::new();
    let summarizer = Summarizer::default();
    feed.publish(kept, &summarizer);

    let articles = feed.articles();
    let summaries = feed.summaries();
    assert_eq!(articles.len(), summaries.len());
    for (a, s) in articles.iter().zip(&summaries) {
        assert_eq!(a.id, s.article_id);
        assert_eq!(a.title, s.title);
    }

    // Republish the same list: summaries come out identical (stateless core).
    feed.publish(articles, &summarizer);
    assert_eq!(feed.summaries(), summaries);
}
