// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod feed;
pub mod fetch;
pub mod metrics;
pub mod prefs;
pub mod summary;
pub mod topics;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::fetch::types::{Article, ArticleProvider};
pub use crate::summary::{ArticleSummary, Lexicon, Summarizer};
pub use crate::topics::{Topic, TopicCatalog, TopicCatalogHandle};
