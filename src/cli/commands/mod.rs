//! Command implementations

mod cache;
mod config;
mod install;

pub use cache::execute as cache;
pub use config::execute as config;
pub use install::execute as install;
