// src/prefs.rs
//! Per-user preferences: two string-id lists (followed articles, selected
//! topics) keyed by a caller-supplied user id. Backed by a single JSON file;
//! every mutation persists. Identity verification belongs to the auth
//! collaborators in front of this service, not here.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PREFS_STORE_PATH: &str = "prefs.json";
pub const ENV_PREFS_STORE_PATH: &str = "PREFS_STORE_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub followed_article_ids: Vec<String>,
    #[serde(default)]
    pub selected_topic_ids: Vec<String>,
}

/// JSON-file-backed preferences store. Missing or unreadable files start
/// empty rather than failing, matching the rest of the config surface.
#[derive(Debug)]
pub struct PrefsStore {
    path: Option<PathBuf>,
    inner: Mutex<HashMap<String, UserPreferences>>,
}

impl PrefsStore {
    /// Load the store from a JSON file, starting empty on any read error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
            Err(_) => HashMap::new(),
        };
        Self {
            path: Some(path),
            inner: Mutex::new(map),
        }
    }

    /// Resolve $PREFS_STORE_PATH, then `prefs.json`.
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_PREFS_STORE_PATH)
            .unwrap_or_else(|_| DEFAULT_PREFS_STORE_PATH.to_string());
        Self::load_from_file(path)
    }

    /// Volatile store for tests.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Preferences for a user; absent users read as empty lists.
    pub fn get(&self, user: &str) -> UserPreferences {
        let map = self.inner.lock().expect("prefs mutex poisoned");
        map.get(user).cloned().unwrap_or_default()
    }

    pub fn set_selected_topics(&self, user: &str, ids: Vec<String>) -> Result<()> {
        self.update(user, |prefs| prefs.selected_topic_ids = clean_ids(ids))
    }

    pub fn set_followed_articles(&self, user: &str, ids: Vec<String>) -> Result<()> {
        self.update(user, |prefs| prefs.followed_article_ids = clean_ids(ids))
    }

    /// Selected topic ids as a set, the shape the classifier consumes.
    pub fn selected_topic_set(&self, user: &str) -> HashSet<String> {
        self.get(user).selected_topic_ids.into_iter().collect()
    }

    fn update<F: FnOnce(&mut UserPreferences)>(&self, user: &str, apply: F) -> Result<()> {
        let mut map = self.inner.lock().expect("prefs mutex poisoned");
        let prefs = map.entry(user.to_string()).or_default();
        apply(prefs);
        self.persist(&map)
    }

    fn persist(&self, map: &HashMap<String, UserPreferences>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(map).context("serializing prefs")?;
        fs::write(path, json).with_context(|| format!("writing prefs to {}", path.display()))
    }
}

/// Trim entries, drop empties, dedup while preserving first-seen order.
fn clean_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let t = id.trim();
        if t.is_empty() {
            continue;
        }
        if seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}
