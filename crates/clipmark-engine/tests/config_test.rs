use clipmark_engine::config::{ClipmarkConfig, ConfigError, ConfigLoader};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_partial_config_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "highlight:\n  temporary_ms: 500\nstorage:\n  path: /tmp/clips.json").unwrap();

    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    assert_eq!(config.storage.path.to_str(), Some("/tmp/clips.json"));
    assert_eq!(config.highlight.temporary_ms, 500);
    assert!(config.highlight.scroll);
    assert_eq!(config.logging.filter, "info");

    let settings = config.highlight.settings();
    assert_eq!(settings.temporary, Duration::from_millis(500));
}

#[tokio::test]
async fn test_defaults() {
    let config = ClipmarkConfig::default();
    assert_eq!(config.highlight.temporary_ms, 2000);
    assert!(config.storage.path.ends_with(".clipmark/storage.json"));
}

#[tokio::test]
async fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(matches!(
        ConfigLoader::load_from(&missing).await,
        Err(ConfigError::Io { path, .. }) if path == missing
    ));

    let bad = dir.path().join("bad.yaml");
    std::fs::write(&bad, "highlight: [1, 2").unwrap();
    assert!(matches!(
        ConfigLoader::load_from(&bad).await,
        Err(ConfigError::Parse { path, .. }) if path == bad
    ));
}

#[tokio::test]
async fn test_relative_store_path_follows_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("clipmark.yaml");
    std::fs::write(&file, "storage:\n  path: data/clips.json\n").unwrap();

    let config = ConfigLoader::load_from(&file).await.unwrap();
    assert_eq!(config.storage.path, dir.path().join("data/clips.json"));
}

#[test]
fn test_search_paths_start_in_working_directory() {
    let paths = ConfigLoader::search_paths();
    assert_eq!(paths[0], std::path::PathBuf::from("clipmark.yaml"));
}
