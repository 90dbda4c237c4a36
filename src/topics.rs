// src/topics.rs
//! Topic catalog and substring classifier: a fixed, ordered list of named
//! topics, each with a lowercase keyword set. An article matches a topic iff
//! any keyword occurs case-insensitively in `title + " " + description`.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fetch::types::Article;

// --- env defaults & names ---
pub const DEFAULT_TOPICS_CONFIG_PATH: &str = "config/topics.toml";

pub const ENV_TOPICS_CONFIG_PATH: &str = "TOPICS_CONFIG_PATH";
pub const ENV_TOPICS_HOT_RELOAD: &str = "TOPICS_HOT_RELOAD";

// Dev logging gate: FEED_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("FEED_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Minimal, anonymized dev logger for classification events.
/// Never logs raw article text. Only hashed id + matched topic ids.
fn dev_log_classification(article_id: &str, matched: &[&str]) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(article_id);
    info!(target: "topics", %id, matched = ?matched, "classified");
}

/// One catalog entry. `keywords` are stored lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogRoot {
    topics: Vec<Topic>,
}

/// Fixed, ordered topic catalog. Immutable once built; `TopicCatalogHandle`
/// swaps whole catalogs on reload rather than mutating in place.
#[derive(Debug, Clone)]
pub struct TopicCatalog {
    topics: Vec<Topic>,
}

impl TopicCatalog {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    /// Parse a `[[topics]]` TOML table. Keywords are lowercased on load so
    /// matching never depends on config casing.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let root: CatalogRoot = toml::from_str(toml_str)?;
        if root.topics.is_empty() {
            anyhow::bail!("topic catalog is empty");
        }
        let topics = root
            .topics
            .into_iter()
            .map(|t| Topic {
                id: t.id,
                name: t.name,
                keywords: t.keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Ok(Self { topics })
    }

    /// Resolve $TOPICS_CONFIG_PATH, then `config/topics.toml`, then the
    /// built-in seed catalog.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_TOPICS_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_TOPICS_CONFIG_PATH.to_string());
        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content).unwrap_or_else(|e| {
                tracing::warn!(error = ?e, path = %path, "invalid topic catalog, using seed");
                Self::default_seed()
            }),
            Err(_) => Self::default_seed(),
        }
    }

    /// Built-in 16-topic catalog matching the shipped client.
    pub fn default_seed() -> Self {
        fn seed(name: &str, keywords: &[&str]) -> Topic {
            Topic {
                id: name.to_string(),
                name: name.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            }
        }

        Self {
            topics: vec![
                seed("World", &["global", "international", "world", "united nations", "summit", "diplomacy"]),
                seed("Politics", &["election", "parliament", "president", "government", "policy", "vote", "minister"]),
                seed("Business", &["business", "company", "ceo", "corporate", "earnings", "revenue", "merger"]),
                seed("Markets", &["stocks", "shares", "markets", "index", "trading", "dow", "nasdaq"]),
                seed("Technology", &["tech", "ai", "software", "hardware", "startup", "cyber", "device"]),
                seed("Science", &["research", "science", "study", "scientist", "space", "physics", "biology"]),
                seed("Climate", &["climate", "carbon", "emissions", "warming", "weather", "extreme", "sustainability"]),
                seed("Health", &["health", "medical", "hospital", "disease", "virus", "vaccine", "mental"]),
                seed("Culture", &["culture", "art", "music", "film", "festival", "books", "heritage"]),
                seed("Opinion", &["opinion", "editorial", "column", "commentary", "analysis"]),
                seed("Sports", &["sport", "football", "soccer", "basketball", "tennis", "cricket", "olympics"]),
                seed("Travel", &["travel", "tourism", "flight", "airline", "hotel", "destination"]),
                seed("Education", &["education", "school", "university", "students", "learning", "teachers"]),
                seed("Justice", &["court", "trial", "judge", "justice", "law", "legal"]),
                seed("Security", &["security", "defense", "military", "attack", "police", "conflict"]),
                seed("Energy", &["energy", "oil", "gas", "renewable", "power", "electricity"]),
            ],
        }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Topics whose keywords occur in the article text, in catalog order.
    pub fn topics_for(&self, article: &Article) -> Vec<&Topic> {
        let text = format!(
            "{} {}",
            article.title,
            article.description.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        let matched: Vec<&Topic> = self
            .topics
            .iter()
            .filter(|t| t.keywords.iter().any(|k| text.contains(k.as_str())))
            .collect();
        let ids: Vec<&str> = matched.iter().map(|t| t.id.as_str()).collect();
        dev_log_classification(&article.id, &ids);
        matched
    }

    /// True iff the article's matched topic ids intersect the selection.
    pub fn matches_selection(&self, article: &Article, selected: &HashSet<String>) -> bool {
        if selected.is_empty() {
            return false;
        }
        self.topics_for(article)
            .iter()
            .any(|t| selected.contains(&t.id))
    }

    /// Ordered sub-sequence of `articles` matching the selection.
    pub fn filter_by_selection<'a>(
        &self,
        articles: &'a [Article],
        selected: &HashSet<String>,
    ) -> Vec<&'a Article> {
        articles
            .iter()
            .filter(|a| self.matches_selection(a, selected))
            .collect()
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self::default_seed()
    }
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

/// A threadsafe handle that can swap the underlying catalog on reload.
#[derive(Clone)]
pub struct TopicCatalogHandle {
    inner: Arc<RwLock<TopicCatalog>>,
}

impl TopicCatalogHandle {
    pub fn new(catalog: TopicCatalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(catalog)),
        }
    }

    pub fn topics(&self) -> Vec<Topic> {
        match self.inner.read() {
            Ok(cat) => cat.topics().to_vec(),
            Err(_) => Vec::new(),
        }
    }

    pub fn topics_for(&self, article: &Article) -> Vec<Topic> {
        match self.inner.read() {
            Ok(cat) => cat.topics_for(article).into_iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn filter_by_selection(
        &self,
        articles: &[Article],
        selected: &HashSet<String>,
    ) -> Vec<Article> {
        match self.inner.read() {
            Ok(cat) => cat
                .filter_by_selection(articles, selected)
                .into_iter()
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Re-read the catalog from the resolved config path. Returns the number
    /// of topics now live.
    pub fn reload_from_disk(&self) -> anyhow::Result<usize> {
        let path = std::env::var(ENV_TOPICS_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_TOPICS_CONFIG_PATH.to_string());
        let content = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading topic catalog at {}: {}", path, e))?;
        let fresh = TopicCatalog::from_toml_str(&content)?;
        let n = fresh.topics().len();
        if let Ok(mut guard) = self.inner.write() {
            *guard = fresh;
        }
        Ok(n)
    }
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_TOPICS_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Start a simple polling watcher on `path` that swaps the catalog when the
/// file's mtime moves. Polls every 2s. Uses only std, no external deps.
pub fn start_hot_reload_thread(handle: TopicCatalogHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => {
                    let changed = match last_mtime {
                        None => {
                            last_mtime = Some(mtime);
                            false
                        }
                        Some(prev) => mtime > prev,
                    };
                    if changed {
                        if let Ok(content) = fs::read_to_string(&path) {
                            if let Ok(fresh) = TopicCatalog::from_toml_str(&content) {
                                if let Ok(mut guard) = handle.inner.write() {
                                    *guard = fresh;
                                }
                                info!(target: "topics", path = %path.display(), "catalog reloaded");
                            }
                        }
                        last_mtime = Some(mtime);
                    }
                }
                Err(_) => {
                    // File missing or unreadable; keep trying.
                }
            }
            thread::sleep(poll);
        }
    });
}

/* ----------------------------
Tests
---------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal, deterministic catalog used only for tests.
    const TEST_TOML: &str = r#"
[[topics]]
id = "Energy"
name = "Energy"
keywords = ["Energy", "oil", "gas"]

[[topics]]
id = "Security"
name = "Security"
keywords = ["security", "attack"]

[[topics]]
id = "Sports"
name = "Sports"
keywords = ["football", "olympics"]
"#;

    fn cat() -> TopicCatalog {
        TopicCatalog::from_toml_str(TEST_TOML).expect("load test catalog")
    }

    fn article(title: &str, description: Option<&str>) -> Article {
        Article {
            id: format!("https://example.test/{title}"),
            title: title.to_string(),
            description: description.map(str::to_string),
            source_name: "BBC News".to_string(),
            url_to_image: None,
            published_at: 0,
        }
    }

    fn ids(topics: Vec<&Topic>) -> Vec<&str> {
        topics.into_iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn matching_is_case_insensitive_and_substring_based() {
        let c = cat();
        let a = article("Oil prices surge amid Energy crisis", None);
        assert_eq!(ids(c.topics_for(&a)), vec!["Energy"]);
    }

    #[test]
    fn keywords_from_config_are_lowercased_on_load() {
        let c = cat();
        // "Energy" in the TOML must match lowercase text.
        let a = article("the energy transition", None);
        assert_eq!(ids(c.topics_for(&a)), vec!["Energy"]);
    }

    #[test]
    fn description_participates_in_matching() {
        let c = cat();
        let a = article("Pipeline shut down", Some("A cyber attack on the operator"));
        assert_eq!(ids(c.topics_for(&a)), vec!["Security"]);
    }

    #[test]
    fn result_preserves_catalog_order() {
        let c = cat();
        let a = article("Attack on oil terminal before the olympics", None);
        assert_eq!(ids(c.topics_for(&a)), vec!["Energy", "Security", "Sports"]);
    }

    #[test]
    fn empty_selection_matches_nothing() {
        let c = cat();
        let a = article("Oil prices surge", None);
        assert!(!c.matches_selection(&a, &HashSet::new()));
    }

    #[test]
    fn filter_preserves_input_order_and_the_iff_property() {
        let c = cat();
        let list = vec![
            article("Oil output cut", None),
            article("Quiet day in parliament", None),
            article("Football final tonight", None),
        ];
        let selected: HashSet<String> =
            ["Energy".to_string(), "Sports".to_string()].into_iter().collect();

        let filtered = c.filter_by_selection(&list, &selected);
        let titles: Vec<&str> = filtered.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Oil output cut", "Football final tonight"]);

        for a in &list {
            let in_filtered = filtered.iter().any(|f| f.id == a.id);
            let intersects = c
                .topics_for(a)
                .iter()
                .any(|t| selected.contains(&t.id));
            assert_eq!(in_filtered, intersects, "iff violated for {}", a.title);
        }
    }

    #[test]
    fn seed_catalog_has_sixteen_topics_in_fixed_order() {
        let c = TopicCatalog::default_seed();
        assert_eq!(c.topics().len(), 16);
        assert_eq!(c.topics()[0].id, "World");
        assert_eq!(c.topics()[15].id, "Energy");
    }

    #[test]
    fn seed_catalog_tags_energy_crisis_headline() {
        let c = TopicCatalog::default_seed();
        let a = article("Oil prices surge amid Energy crisis", None);
        let matched = ids(c.topics_for(&a));
        assert!(matched.contains(&"Energy"));
        assert!(!matched.contains(&"Security"));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(TopicCatalog::from_toml_str("topics = []").is_err());
    }

    #[test]
    fn handle_reload_is_visible_to_readers() {
        let handle = TopicCatalogHandle::new(cat());
        assert_eq!(handle.topics().len(), 3);
        // Swap through the same lock the watcher uses.
        if let Ok(mut guard) = handle.inner.write() {
            *guard = TopicCatalog::default_seed();
        }
        assert_eq!(handle.topics().len(), 16);
    }
}
