// src/fetch/providers/news_api.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::fetch::config::FetchConfig;
use crate::fetch::types::{Article, ArticleProvider};

pub const DEFAULT_NEWS_API_BASE: &str = "https://newsapi.org/v2/top-headlines";

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP_MS: u64 = 500;

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    source: RawSource,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

fn parse_rfc3339_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts, &Rfc3339)
        .ok()
        .map(|dt| dt.unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

/// Top-headlines provider. Fixture mode parses a captured JSON body so tests
/// and offline runs never open a socket; HTTP mode retries up to 3 times with
/// a linear backoff before giving up.
pub struct NewsApiProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        api_key: String,
        client: reqwest::Client,
    },
}

impl NewsApiProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_config(cfg: &FetchConfig, api_key: String) -> Self {
        let url = format!("{}?sources={}", cfg.api_base, cfg.sources);
        Self {
            mode: Mode::Http {
                url,
                api_key,
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse_articles_from_str(s: &str) -> Result<Vec<Article>> {
        let t0 = std::time::Instant::now();

        let resp: NewsResponse = serde_json::from_str(s).context("parsing news api json")?;
        if resp.status != "ok" {
            return Err(anyhow!(
                "news api returned status {:?}: {}",
                resp.status,
                resp.message.unwrap_or_default()
            ));
        }

        let mut out = Vec::with_capacity(resp.articles.len());
        for raw in resp.articles {
            let title = raw.title.unwrap_or_default();
            // Canonical URL is the id; a linkless item falls back to its title.
            let id = raw
                .url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| title.clone());
            if id.is_empty() {
                continue;
            }
            out.push(Article {
                id,
                title,
                description: raw.description.filter(|d| !d.is_empty()),
                source_name: raw.source.name.unwrap_or_default(),
                url_to_image: raw.url_to_image.filter(|u| !u.is_empty()),
                published_at: raw
                    .published_at
                    .as_deref()
                    .map(parse_rfc3339_to_unix)
                    .unwrap_or(0),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("fetch_parse_ms").record(ms);
        counter!("fetch_articles_total").increment(out.len() as u64);

        Ok(out)
    }
}

async fn fetch_body(client: &reqwest::Client, url: &str, api_key: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header("X-Api-Key", api_key)
        .send()
        .await
        .context("news api get()")?;
    let resp = resp.error_for_status().context("news api status")?;
    resp.text().await.context("news api body")
}

#[async_trait]
impl ArticleProvider for NewsApiProvider {
    async fn fetch_latest(&self) -> Result<Vec<Article>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_articles_from_str(s),

            Mode::Http {
                url,
                api_key,
                client,
            } => {
                let mut last_err: Option<anyhow::Error> = None;
                for attempt in 1..=MAX_ATTEMPTS {
                    match fetch_body(client, url, api_key).await {
                        Ok(body) => return Self::parse_articles_from_str(&body),
                        Err(e) => {
                            tracing::warn!(
                                error = ?e,
                                attempt,
                                provider = "NewsAPI",
                                "fetch attempt failed"
                            );
                            last_err = Some(e);
                        }
                    }
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(std::time::Duration::from_millis(
                            BACKOFF_STEP_MS * attempt as u64,
                        ))
                        .await;
                    }
                }
                Err(last_err.unwrap_or_else(|| anyhow!("news api fetch failed")))
            }
        }
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}
