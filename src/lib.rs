//! leinup - Leiningen installer for CI runners
//!
//! Resolves a requested Leiningen version to a cached installation,
//! downloading and staging it on a cache miss, and produces the
//! environment changes (`LEIN_HOME`, PATH prepend) later job steps need.

pub mod cache;
pub mod cli;
pub mod config;
pub mod download;
pub mod env;
pub mod error;
pub mod installer;

pub use error::{LeinupError, LeinupResult};
pub use installer::{Installer, SetupOutcome};
