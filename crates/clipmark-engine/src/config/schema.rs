use clipmark_core::HighlightSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipmarkConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file backing the key-value store.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".clipmark"))
        .unwrap_or_else(|| PathBuf::from(".clipmark"))
        .join("storage.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    #[serde(default = "default_temporary_ms")]
    pub temporary_ms: u64,
    #[serde(default = "default_scroll")]
    pub scroll: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            temporary_ms: default_temporary_ms(),
            scroll: default_scroll(),
        }
    }
}

impl HighlightConfig {
    pub fn settings(&self) -> HighlightSettings {
        HighlightSettings {
            temporary: Duration::from_millis(self.temporary_ms),
            scroll: self.scroll,
        }
    }
}

fn default_temporary_ms() -> u64 {
    2000
}

fn default_scroll() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `CLIPMARK_LOG`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}
