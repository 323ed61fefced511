//! Proxydeck Common Library
//!
//! Instance storage, configuration, and the Proxifier profile generator shared
//! by the Proxydeck CLI and web service.

pub mod config;
pub mod db;
pub mod error;
pub mod instances;
pub mod ppx;
pub mod types;

// Re-export commonly used types
pub use config::ProxydeckConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use instances::{InstanceRepo, InstanceStore};
pub use ppx::{GeneratedProfile, ProfileGenerator, ProfilePlan};
pub use types::*;

/// Proxydeck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".proxydeck")
}

/// Default configuration file path
pub fn default_config_path() -> std::path::PathBuf {
    default_store_path().join("config.toml")
}

/// Default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_store_path().join("state.db")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
