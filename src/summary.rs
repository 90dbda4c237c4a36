// src/summary.rs
//! Headline summarizer and trend predictor.
//!
//! Pure functions over `(title, description)`: a short list of capitalized
//! keyword chips, a predictive-claim flag, and (when the flag is set) a
//! deterministic 7-point series seeded from the title. Same input always
//! yields byte-identical output; nothing here touches I/O or shared state.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::fetch::types::Article;

pub const DEFAULT_SUMMARY_CONFIG_PATH: &str = "config/summary.toml";
pub const ENV_SUMMARY_CONFIG_PATH: &str = "SUMMARY_CONFIG_PATH";

/// Number of points in a synthetic prediction series.
pub const SERIES_LEN: usize = 7;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "to", "of", "in", "on", "for",
    "with", "at", "by", "from", "up", "about", "into", "over", "after", "before",
    "under", "again", "further", "then", "once", "is", "are", "was", "were", "be",
    "been", "being", "as", "it", "its", "this", "that", "these", "those", "their",
    "they", "them", "he", "she", "his", "her", "we", "our", "you", "your",
];

// Matched as unanchored substrings: a title containing "skill" trips "will".
// That is the shipped client behavior and the golden tests pin it.
const TRIGGERS: &[&str] = &[
    "forecast", "predict", "prediction", "expected", "outlook", "projected",
    "estimate", "could", "likely", "set to", "will", "trend", "rise", "fall",
];

static DEFAULT_LEXICON: Lazy<Lexicon> = Lazy::new(Lexicon::default_seed);

/// Stop-word and trigger tables. Configuration data, not behavior: tests can
/// substitute a smaller table without touching the algorithm.
#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
    pub stop_words: HashSet<String>,
    pub triggers: Vec<String>,
}

impl Lexicon {
    /// Built-in tables matching the shipped client.
    pub fn default_seed() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            triggers: TRIGGERS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Parse a TOML override (`stop_words = [...]`, `triggers = [...]`).
    /// Entries are lowercased on load; matching is done on lowercased text.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: Lexicon = toml::from_str(toml_str)?;
        Ok(Self {
            stop_words: raw
                .stop_words
                .into_iter()
                .map(|w| w.to_lowercase())
                .collect(),
            triggers: raw.triggers.into_iter().map(|w| w.to_lowercase()).collect(),
        })
    }

    /// Resolve $SUMMARY_CONFIG_PATH, then `config/summary.toml`, then the
    /// built-in seed. A present-but-broken file falls back to the seed too.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_SUMMARY_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_SUMMARY_CONFIG_PATH.to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content).unwrap_or_else(|e| {
                tracing::warn!(error = ?e, path = %path, "invalid summary lexicon, using seed");
                Self::default_seed()
            }),
            Err(_) => Self::default_seed(),
        }
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        DEFAULT_LEXICON.clone()
    }
}

/// Per-article analytics payload shown on the analytics tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub article_id: String,
    pub title: String,
    pub source_name: String,
    /// 0–4 capitalized keyword chips.
    pub keywords: Vec<String>,
    pub is_predictive: bool,
    /// Empty unless `is_predictive`; else exactly 7 values in [0.0, 1.0].
    pub series: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Summarizer {
    lexicon: Lexicon,
}

impl Summarizer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Summarizer with the built-in tables, optionally overridden from disk.
    pub fn from_env() -> Self {
        Self::new(Lexicon::load_default())
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn summarize(&self, article: &Article) -> ArticleSummary {
        let keywords = summary_words(&article.title, &self.lexicon);
        let is_predictive =
            looks_predictive(&article.title, article.description.as_deref(), &self.lexicon);
        let series = if is_predictive {
            prediction_series(&article.title)
        } else {
            Vec::new()
        };
        ArticleSummary {
            article_id: article.id.clone(),
            title: article.title.clone(),
            source_name: article.source_name.clone(),
            keywords,
            is_predictive,
            series,
        }
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new(Lexicon::default())
    }
}

/// First 3 non-stop-word tokens of the lowercased title, capitalized, in
/// original order. If nothing survives (all stop-words or punctuation), the
/// first 4 whitespace-separated words of the raw title, casing preserved.
pub fn summary_words(title: &str, lexicon: &Lexicon) -> Vec<String> {
    let lowered = title.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !lexicon.stop_words.contains(*t))
        .take(3)
        .collect();

    if tokens.is_empty() {
        return title
            .split_whitespace()
            .take(4)
            .map(str::to_string)
            .collect();
    }

    tokens.into_iter().map(capitalize).collect()
}

/// True iff any trigger occurs in the lowercased `title + " " + description`.
/// Unanchored containment, not word-boundary matching.
pub fn looks_predictive(title: &str, description: Option<&str>, lexicon: &Lexicon) -> bool {
    let text = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();
    lexicon.triggers.iter().any(|t| text.contains(t.as_str()))
}

/// Deterministic 7-point series in [0.0, 1.0], seeded from the title text.
/// Seed = sum of Unicode scalar values; state starts at `max(1, seed % 97)`
/// and steps through `value = (value * 37 + 17) % 100`.
pub fn prediction_series(title: &str) -> Vec<f64> {
    let seed: u64 = title.chars().map(|c| c as u64).sum();
    let mut value = (seed % 97).max(1);
    let mut series = Vec::with_capacity(SERIES_LEN);
    for _ in 0..SERIES_LEN {
        value = (value * 37 + 17) % 100;
        series.push(value as f64 / 100.0);
    }
    series
}

/// Title-case a single lowercase token: first scalar uppercased, rest kept.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
