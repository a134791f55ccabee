//! Cache entry metadata for listing and cleanup

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// State of one cached installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Directory and completion marker both present
    Complete,
    /// Directory present without its marker; treated as a miss
    Partial,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

/// One cached installation, as reported by `leinup cache list`
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    /// Tool name (cache key component)
    pub tool: String,
    /// Normalized version key
    pub version: String,
    /// CPU architecture the entry was stored for
    pub arch: String,
    /// Whether the entry may be trusted
    pub state: CacheState,
    /// Installation directory
    pub path: PathBuf,
    /// When the entry appeared in the cache
    pub created_at: DateTime<Utc>,
}
