// src/fetch/types.rs
use anyhow::Result;

/// One news item as the rest of the crate sees it. `id` is the canonical URL
/// (or the title when a feed item carries no link) and uniquely identifies an
/// article within a feed snapshot.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub source_name: String, // e.g., "BBC News", "Al Jazeera English"
    pub url_to_image: Option<String>,
    pub published_at: u64, // unix seconds, 0 when the feed omits it
}

#[async_trait::async_trait]
pub trait ArticleProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
}
