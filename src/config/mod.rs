//! Configuration management for leinup

pub mod schema;

pub use schema::Config;

use crate::error::{LeinupError, LeinupResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leinup")
            .join("config.toml")
    }

    /// Path this manager reads from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration; a missing file yields the defaults
    pub async fn load(&self) -> LeinupResult<Config> {
        match fs::read_to_string(&self.config_path).await {
            Ok(text) => {
                debug!(path = %self.config_path.display(), "loaded config file");
                toml::from_str(&text).map_err(|e| LeinupError::ConfigInvalid {
                    path: self.config_path.clone(),
                    reason: e.to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.config_path.display(), "no config file, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(LeinupError::io(
                format!("reading {}", self.config_path.display()),
                e,
            )),
        }
    }

    /// Write the default configuration file
    pub async fn init(&self, force: bool) -> LeinupResult<()> {
        if !force && fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Err(LeinupError::ConfigExists(self.config_path.clone()));
        }
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LeinupError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        let text = toml::to_string_pretty(&Config::default())?;
        fs::write(&self.config_path, text)
            .await
            .map_err(|e| LeinupError::io(format!("writing {}", self.config_path.display()), e))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(tmp.path().join("config.toml"));
        let config = manager.load().await.unwrap();
        assert!(config.install.smoke_test);
    }

    #[tokio::test]
    async fn load_invalid_toml_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "not [valid toml").await.unwrap();
        let manager = ConfigManager::with_path(path);
        let result = manager.load().await;
        assert!(matches!(result, Err(LeinupError::ConfigInvalid { .. })));
    }

    #[tokio::test]
    async fn init_writes_and_refuses_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path.clone());

        manager.init(false).await.unwrap();
        assert!(path.is_file());

        let result = manager.init(false).await;
        assert!(matches!(result, Err(LeinupError::ConfigExists(_))));

        manager.init(true).await.unwrap();
    }

    #[tokio::test]
    async fn init_then_load_roundtrips() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(tmp.path().join("config.toml"));
        manager.init(false).await.unwrap();
        let config = manager.load().await.unwrap();
        assert!(config.download.base_url.contains("leiningen"));
    }
}
