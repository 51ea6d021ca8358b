use super::schema::ClipmarkConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Files tried by `load_default`, most specific first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("clipmark.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".clipmark").join("config.yaml"));
        }
        paths
    }

    /// The first existing file of `search_paths`, or built-in defaults.
    pub async fn load_default() -> Result<ClipmarkConfig, ConfigError> {
        for path in Self::search_paths() {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Self::load_from(&path).await;
            }
        }
        debug!("No config file found, using defaults");
        Ok(ClipmarkConfig::default())
    }

    /// Load one file. A relative `storage.path` is taken relative to the
    /// directory holding the config file.
    pub async fn load_from(path: &Path) -> Result<ClipmarkConfig, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config: ClipmarkConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if config.storage.path.is_relative() {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                config.storage.path = dir.join(&config.storage.path);
            }
        }
        Ok(config)
    }
}
