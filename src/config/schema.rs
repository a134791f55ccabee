//! Configuration schema for leinup
//!
//! Configuration is stored at `~/.config/leinup/config.toml`. Runner
//! environment variables (`RUNNER_TOOL_CACHE`, `RUNNER_TEMP`) override
//! the file, matching where a CI runner keeps its tool cache.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tool cache settings
    pub cache: CacheConfig,

    /// Download settings
    pub download: DownloadConfig,

    /// Install settings
    pub install: InstallConfig,
}

/// Tool cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory (default: platform cache dir)
    pub dir: Option<PathBuf>,
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Base URL the version-templated artifact URL is built from
    pub base_url: String,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: "https://raw.githubusercontent.com/technomancy/leiningen".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Install configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Staging/temp root (default: platform temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Run the freshly installed script once before caching
    pub smoke_test: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            smoke_test: true,
        }
    }
}

impl Config {
    /// Resolved cache root: `RUNNER_TOOL_CACHE`, then config, then the
    /// platform cache directory
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os("RUNNER_TOOL_CACHE") {
            return PathBuf::from(dir);
        }
        if let Some(ref dir) = self.cache.dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leinup")
            .join("tools")
    }

    /// Resolved staging root: `RUNNER_TEMP`, then config, then the
    /// platform temp directory
    pub fn temp_dir(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os("RUNNER_TEMP") {
            return PathBuf::from(dir);
        }
        if let Some(ref dir) = self.install.temp_dir {
            return dir.clone();
        }
        std::env::temp_dir()
    }
}
