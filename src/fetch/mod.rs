// src/fetch/mod.rs
pub mod config;
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::fetch::types::{Article, ArticleProvider};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_articles_total", "Total articles parsed from providers.");
        describe_counter!(
            "fetch_kept_total",
            "Articles kept after normalization + dedup."
        );
        describe_counter!(
            "fetch_filtered_total",
            "Articles dropped for empty titles."
        );
        describe_counter!(
            "fetch_dedup_total",
            "Articles removed as exact or near duplicates."
        );
        describe_counter!(
            "fetch_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("fetch_parse_ms", "Provider parse time in milliseconds.");
        describe_gauge!(
            "feed_last_refresh_ts",
            "Unix ts when the feed pipeline last ran."
        );
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace. Headlines
/// keep their punctuation; the summarizer's fallback path depends on it.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Normalize every article, drop empty titles, then drop exact id duplicates
/// and near-duplicate titles within the batch. First occurrence wins, so the
/// provider's ordering survives. Returns (kept, filtered_count, dedup_count).
pub fn normalize_filter_dedup(
    raw: Vec<Article>,
    similarity_threshold: f64,
) -> (Vec<Article>, usize, usize) {
    let mut filtered_out = 0usize;
    let mut dedup_out = 0usize;

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut kept: Vec<Article> = Vec::with_capacity(raw.len());

    for mut article in raw {
        article.title = normalize_text(&article.title);
        article.description = article
            .description
            .map(|d| normalize_text(&d))
            .filter(|d| !d.is_empty());

        if article.title.is_empty() {
            filtered_out += 1;
            continue;
        }
        if !seen_ids.insert(article.id.clone()) {
            dedup_out += 1;
            continue;
        }

        let near_dup = kept.iter().any(|k| {
            strsim::normalized_levenshtein(&k.title, &article.title) >= similarity_threshold
        });
        if near_dup {
            dedup_out += 1;
            continue;
        }

        kept.push(article);
    }

    (kept, filtered_out, dedup_out)
}

/// Run one fetch pass over the providers. Provider failures are logged and
/// counted, never fatal. Returns (kept, filtered_count, dedup_count, errors).
pub async fn run_once(
    providers: &[Box<dyn ArticleProvider>],
    similarity_threshold: f64,
) -> (Vec<Article>, usize, usize, usize) {
    ensure_metrics_described();

    let mut raw = Vec::new();
    let mut errors = 0usize;
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("fetch_provider_errors_total").increment(1);
                errors += 1;
            }
        }
    }

    let (kept, filtered_cnt, dedup_cnt) = normalize_filter_dedup(raw, similarity_threshold);

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    counter!("fetch_kept_total").increment(kept.len() as u64);
    counter!("fetch_filtered_total").increment(filtered_cnt as u64);
    counter!("fetch_dedup_total").increment(dedup_cnt as u64);
    gauge!("feed_last_refresh_ts").set(now as f64);

    (kept, filtered_cnt, dedup_cnt, errors)
}
