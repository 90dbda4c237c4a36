// tests/config_tables.rs
// The shipped config files must agree with the built-in seeds: a deployment
// that deletes them gets identical behavior from the fallbacks.

use headline_analyzer::summary::Lexicon;
use headline_analyzer::topics::TopicCatalog;

#[test]
fn shipped_topic_catalog_matches_the_seed() {
    let shipped = TopicCatalog::from_toml_str(include_str!("../config/topics.toml"))
        .expect("shipped catalog parses");
    let seed = TopicCatalog::default_seed();

    assert_eq!(shipped.topics().len(), seed.topics().len());
    for (a, b) in shipped.topics().iter().zip(seed.topics()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.keywords, b.keywords, "keywords differ for {}", a.id);
    }
}

#[test]
fn shipped_summary_lexicon_matches_the_seed() {
    let shipped = Lexicon::from_toml_str(include_str!("../config/summary.toml"))
        .expect("shipped lexicon parses");
    let seed = Lexicon::default_seed();

    assert_eq!(shipped.stop_words, seed.stop_words);
    assert_eq!(shipped.triggers, seed.triggers);
}

#[test]
fn shipped_fetch_config_parses() {
    let cfg = headline_analyzer::fetch::config::load_fetch_config_from(std::path::Path::new(
        "config/fetch.toml",
    ))
    .expect("fetch config parses");
    assert_eq!(cfg.sources, "bbc-news", "default source changed");
    assert_eq!(cfg.interval_secs, 300);
}

mod env_resolution {
    use std::io::Write as _;

    use headline_analyzer::fetch::config::{
        load_fetch_config_default, ENV_FETCH_CONFIG_PATH,
    };
    use headline_analyzer::prefs::{PrefsStore, ENV_PREFS_STORE_PATH};

    #[serial_test::serial]
    #[test]
    fn fetch_config_env_path_wins() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"[fetch]\nsources = \"al-jazeera-english\"\ninterval_secs = 60\n")
            .unwrap();

        std::env::set_var(ENV_FETCH_CONFIG_PATH, f.path());
        let cfg = load_fetch_config_default();
        std::env::remove_var(ENV_FETCH_CONFIG_PATH);

        assert_eq!(cfg.sources, "al-jazeera-english");
        assert_eq!(cfg.interval_secs, 60);
    }

    #[serial_test::serial]
    #[test]
    fn prefs_store_env_path_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        std::env::set_var(ENV_PREFS_STORE_PATH, &path);
        let store = PrefsStore::from_env();
        store
            .set_selected_topics("u1", vec!["Climate".to_string()])
            .unwrap();
        drop(store);

        let again = PrefsStore::from_env();
        std::env::remove_var(ENV_PREFS_STORE_PATH);

        assert_eq!(again.get("u1").selected_topic_ids, vec!["Climate".to_string()]);
    }
}
