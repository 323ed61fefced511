//! CLI command implementations

pub mod config;
pub mod instance;
pub mod ppx;

use std::path::PathBuf;

use anyhow::Result;
use proxydeck_common::{Database, InstanceRepo, ProxydeckConfig};
use tracing::debug;

use crate::output::OutputFormat;

/// Resolved global options shared by every command
pub struct Context {
    pub config: ProxydeckConfig,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub format: OutputFormat,
}

impl Context {
    pub fn repo(&self) -> Result<InstanceRepo> {
        debug!("Opening instance store at {}", self.db_path.display());
        let db = Database::open(&self.db_path)?;
        Ok(InstanceRepo::new(db))
    }
}
