//! Local tool cache
//!
//! Installations are stored under `<root>/<tool>/<version-key>/<arch>/`
//! with a sentinel file `<root>/<tool>/<version-key>/<arch>.complete`
//! written after the directory is fully in place. A directory without
//! its marker was interrupted mid-store and is never trusted.
//!
//! The layout matches the runner tool cache the original CI action used,
//! so `RUNNER_TOOL_CACHE` can point at a pre-seeded cache.

pub mod entry;
pub mod store;

pub use entry::{CacheEntry, CacheState};
pub use store::ToolCache;
