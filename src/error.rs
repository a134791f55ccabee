//! Error types for leinup
//!
//! All modules use `LeinupResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for leinup operations
pub type LeinupResult<T> = Result<T, LeinupError>;

/// All errors that can occur in leinup
#[derive(Error, Debug)]
pub enum LeinupError {
    // Download errors
    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    // Install errors
    #[error("Downloaded artifact is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Smoke test failed: {command}: {detail}")]
    SmokeTest { command: String, detail: String },

    // Cache errors
    #[error("Cache entry is not a directory: {0}")]
    CacheEntryInvalid(PathBuf),

    // Environment export errors
    #[error("Cannot export {name}: {reason}")]
    EnvExport { name: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file already exists: {0}")]
    ConfigExists(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LeinupError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a download error
    pub fn download(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a smoke test error
    pub fn smoke_test(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SmokeTest {
            command: command.into(),
            detail: detail.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Download { .. } => {
                Some("Check that the requested version matches a published Leiningen release")
            }
            Self::ConfigExists(_) => Some("Use --force to overwrite"),
            Self::SmokeTest { .. } => {
                Some("The installed script could not run; a JVM may be missing from the runner")
            }
            _ => None,
        }
    }
}
