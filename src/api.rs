// src/api.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;

use crate::feed::{self, Feed, FeedStatus};
use crate::fetch::types::Article;
use crate::prefs::{PrefsStore, UserPreferences};
use crate::summary::{self, Summarizer};
use crate::topics::TopicCatalogHandle;

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<Feed>,
    pub summarizer: Arc<Summarizer>,
    pub topics: TopicCatalogHandle,
    pub prefs: Arc<PrefsStore>,
    pub refresh: Arc<Notify>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/feed", get(get_feed))
        .route("/feed/followed", get(get_followed))
        .route("/analytics", get(get_analytics))
        .route("/topics", get(get_topics))
        .route("/analyze", post(analyze))
        .route("/classify", post(classify))
        .route("/prefs", get(get_prefs))
        .route("/prefs/topics", post(set_pref_topics))
        .route("/prefs/follows", post(set_pref_follows))
        .route("/debug/feed-status", get(debug_feed_status))
        .route("/admin/refresh", post(admin_refresh))
        .route("/admin/reload-topics", post(admin_reload_topics))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Current feed, optionally narrowed by `q` (title/description search) and
/// `topics` (comma-separated topic ids, selection-filter semantics).
async fn get_feed(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Article>> {
    let articles = state.feed.articles();

    let searched: Vec<Article> = match params.get("q") {
        Some(q) => feed::filter_by_query(&articles, q)
            .into_iter()
            .cloned()
            .collect(),
        None => articles,
    };

    let out = match params.get("topics") {
        Some(csv) => {
            let selected: HashSet<String> = csv
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            state.topics.filter_by_selection(&searched, &selected)
        }
        None => searched,
    };
    Json(out)
}

/// Articles the user follows, in feed order.
async fn get_followed(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Article>> {
    let user = params.get("user").cloned().unwrap_or_default();
    let followed: HashSet<String> = state
        .prefs
        .get(&user)
        .followed_article_ids
        .into_iter()
        .collect();
    let out = state
        .feed
        .articles()
        .into_iter()
        .filter(|a| followed.contains(&a.id))
        .collect();
    Json(out)
}

async fn get_analytics(State(state): State<AppState>) -> Json<Vec<summary::ArticleSummary>> {
    Json(state.feed.summaries())
}

#[derive(serde::Serialize)]
struct TopicInfo {
    id: String,
    name: String,
}

async fn get_topics(State(state): State<AppState>) -> Json<Vec<TopicInfo>> {
    let out = state
        .topics
        .topics()
        .into_iter()
        .map(|t| TopicInfo {
            id: t.id,
            name: t.name,
        })
        .collect();
    Json(out)
}

#[derive(serde::Deserialize)]
struct TextReq {
    title: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(serde::Serialize)]
struct AnalyzeResp {
    keywords: Vec<String>,
    is_predictive: bool,
    series: Vec<f64>,
}

/// Ad-hoc summary of a title/description pair, outside the feed.
async fn analyze(State(state): State<AppState>, Json(body): Json<TextReq>) -> Json<AnalyzeResp> {
    let lexicon = state.summarizer.lexicon();
    let keywords = summary::summary_words(&body.title, lexicon);
    let is_predictive =
        summary::looks_predictive(&body.title, body.description.as_deref(), lexicon);
    let series = if is_predictive {
        summary::prediction_series(&body.title)
    } else {
        Vec::new()
    };
    Json(AnalyzeResp {
        keywords,
        is_predictive,
        series,
    })
}

/// Ad-hoc topic tagging of a title/description pair.
async fn classify(
    State(state): State<AppState>,
    Json(body): Json<TextReq>,
) -> Json<Vec<TopicInfo>> {
    let article = Article {
        id: body.title.clone(),
        title: body.title,
        description: body.description,
        source_name: String::new(),
        url_to_image: None,
        published_at: 0,
    };
    let out = state
        .topics
        .topics_for(&article)
        .into_iter()
        .map(|t| TopicInfo {
            id: t.id,
            name: t.name,
        })
        .collect();
    Json(out)
}

async fn get_prefs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<UserPreferences> {
    let user = params.get("user").cloned().unwrap_or_default();
    Json(state.prefs.get(&user))
}

#[derive(serde::Deserialize)]
struct SetTopicsReq {
    user: String,
    selected_topic_ids: Vec<String>,
}

async fn set_pref_topics(
    State(state): State<AppState>,
    Json(body): Json<SetTopicsReq>,
) -> Result<Json<UserPreferences>, (StatusCode, String)> {
    state
        .prefs
        .set_selected_topics(&body.user, body.selected_topic_ids)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to save preferences: {e}"),
            )
        })?;
    Ok(Json(state.prefs.get(&body.user)))
}

#[derive(serde::Deserialize)]
struct SetFollowsReq {
    user: String,
    followed_article_ids: Vec<String>,
}

async fn set_pref_follows(
    State(state): State<AppState>,
    Json(body): Json<SetFollowsReq>,
) -> Result<Json<UserPreferences>, (StatusCode, String)> {
    state
        .prefs
        .set_followed_articles(&body.user, body.followed_article_ids)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to save preferences: {e}"),
            )
        })?;
    Ok(Json(state.prefs.get(&body.user)))
}

async fn debug_feed_status(State(state): State<AppState>) -> Json<FeedStatus> {
    Json(state.feed.status())
}

/// Nudge the refresh task to run now instead of waiting for the next tick.
async fn admin_refresh(State(state): State<AppState>) -> String {
    state.refresh.notify_one();
    "refresh scheduled".to_string()
}

async fn admin_reload_topics(State(state): State<AppState>) -> String {
    match state.topics.reload_from_disk() {
        Ok(n) => format!("reloaded {n} topics"),
        Err(e) => format!("failed: {e}"),
    }
}
