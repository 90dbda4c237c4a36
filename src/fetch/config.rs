// src/fetch/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_FETCH_CONFIG_PATH: &str = "config/fetch.toml";

pub const ENV_FETCH_CONFIG_PATH: &str = "FETCH_CONFIG_PATH";
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";

fn default_sources() -> String {
    "bbc-news".to_string()
}
fn default_api_base() -> String {
    crate::fetch::providers::news_api::DEFAULT_NEWS_API_BASE.to_string()
}
fn default_interval_secs() -> u64 {
    300
}
fn default_similarity_threshold() -> f64 {
    0.90
}

/// Feed refresh configuration. The API key never lives in the file; it is
/// read from the environment alongside it.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_sources")]
    pub sources: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            api_base: default_api_base(),
            interval_secs: default_interval_secs(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FetchRoot {
    fetch: FetchConfig,
}

/// Load configuration from an explicit TOML path.
pub fn load_fetch_config_from(path: &Path) -> Result<FetchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading fetch config from {}", path.display()))?;
    let root: FetchRoot = toml::from_str(&content)?;
    Ok(root.fetch)
}

/// Load configuration using env var + fallbacks:
/// 1) $FETCH_CONFIG_PATH
/// 2) config/fetch.toml
/// 3) built-in defaults
pub fn load_fetch_config_default() -> FetchConfig {
    let path = std::env::var(ENV_FETCH_CONFIG_PATH)
        .unwrap_or_else(|_| DEFAULT_FETCH_CONFIG_PATH.to_string());
    match load_fetch_config_from(Path::new(&path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = ?e, path = %path, "fetch config unavailable, using defaults");
            FetchConfig::default()
        }
    }
}

/// Read the news API key from the environment. Empty values count as absent.
pub fn news_api_key_from_env() -> Option<String> {
    std::env::var(ENV_NEWS_API_KEY)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
