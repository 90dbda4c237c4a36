// src/fetch/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::fetch::types::{Article, ArticleProvider};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item")]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

/// RSS provider over a captured XML body. Serves as the offline fallback feed
/// when no API key is configured, and as a second wire shape in tests.
pub struct RssProvider {
    source_name: String,
    rss_content: String,
}

impl RssProvider {
    pub fn from_fixture(source_name: &str, content: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            rss_content: content.to_string(),
        }
    }
}

#[async_trait]
impl ArticleProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<Article>> {
        let t0 = std::time::Instant::now();

        let rss: Rss = from_str(&self.rss_content).context("parsing rss xml")?;
        let mut out = Vec::with_capacity(rss.channel.item.len());

        for it in rss.channel.item {
            let title = it.title.unwrap_or_default();
            let id = it
                .link
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| title.clone());
            if id.is_empty() {
                continue;
            }
            out.push(Article {
                id,
                title,
                description: it.description.filter(|d| !d.is_empty()),
                source_name: self.source_name.clone(),
                url_to_image: None,
                published_at: it
                    .pub_date
                    .as_deref()
                    .map(parse_rfc2822_to_unix)
                    .unwrap_or(0),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("fetch_parse_ms").record(ms);
        counter!("fetch_articles_total").increment(out.len() as u64);

        Ok(out)
    }

    fn name(&self) -> &'static str {
        "RSS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>World feed</title>
    <item>
      <title>Summit opens with climate on the agenda</title>
      <link>https://news.test/summit</link>
      <pubDate>Sat, 07 Feb 2026 09:00:00 GMT</pubDate>
      <description>Leaders gather for two days of talks.</description>
    </item>
    <item>
      <title>Linkless item</title>
      <description>No link on this one.</description>
    </item>
  </channel>
</rss>"#;

    #[tokio::test]
    async fn fixture_parses_into_articles() {
        let p = RssProvider::from_fixture("Al Jazeera English", FIXTURE);
        let out = p.fetch_latest().await.expect("parse fixture");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "https://news.test/summit");
        assert_eq!(out[0].source_name, "Al Jazeera English");
        assert!(out[0].published_at > 0);
        assert_eq!(out[1].id, "Linkless item");
    }

    #[test]
    fn rfc2822_parse_is_total() {
        assert_eq!(parse_rfc2822_to_unix("garbage"), 0);
        assert!(parse_rfc2822_to_unix("Sat, 07 Feb 2026 09:00:00 GMT") > 0);
    }
}
