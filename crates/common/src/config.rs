//! Proxydeck configuration

use crate::ppx::{DEFAULT_ID_BASELINE, MAX_ID_BASELINE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration shared by the CLI and the web service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxydeckConfig {
    /// Store directory path
    pub store_path: PathBuf,

    /// Web service configuration
    pub web: WebConfig,

    /// Profile generator configuration
    pub ppx: PpxConfig,
}

impl Default for ProxydeckConfig {
    fn default() -> Self {
        Self {
            store_path: crate::default_store_path(),
            web: WebConfig::default(),
            ppx: PpxConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address
    pub listen: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PpxConfig {
    /// Allocation starts one above this value when no ids exist yet
    pub id_baseline: i64,

    /// Default export path for generated profiles
    pub output_path: Option<PathBuf>,
}

impl Default for PpxConfig {
    fn default() -> Self {
        Self {
            id_baseline: DEFAULT_ID_BASELINE,
            output_path: None,
        }
    }
}

impl ProxydeckConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_ID_BASELINE).contains(&self.ppx.id_baseline) {
            return Err(Error::InvalidConfig(format!(
                "ppx.id_baseline must be between 0 and {} (got {})",
                MAX_ID_BASELINE, self.ppx.id_baseline
            )));
        }
        if self.web.listen.trim().is_empty() {
            return Err(Error::InvalidConfig("web.listen must not be empty".into()));
        }
        Ok(())
    }

    /// Get the database path
    pub fn db_path(&self) -> PathBuf {
        self.store_path.join("state.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProxydeckConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.ppx.id_baseline, 99);
        assert_eq!(config.web.listen, "127.0.0.1:8080");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let mut config = ProxydeckConfig::default();
        config.store_path = dir.path().to_path_buf();
        config.ppx.id_baseline = 499;
        config.ppx.output_path = Some(dir.path().join("out.ppx"));
        config.save(&path).unwrap();

        let loaded = ProxydeckConfig::load(&path).unwrap();
        assert_eq!(loaded.ppx.id_baseline, 499);
        assert_eq!(loaded.ppx.output_path, config.ppx.output_path);
        assert_eq!(loaded.db_path(), dir.path().join("state.db"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ppx]\nid_baseline = 1000\n").unwrap();

        let loaded = ProxydeckConfig::load(&path).unwrap();
        assert_eq!(loaded.ppx.id_baseline, 1000);
        assert_eq!(loaded.web.listen, "127.0.0.1:8080");
    }

    #[test]
    fn test_negative_baseline_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ppx]\nid_baseline = -5\n").unwrap();

        let err = ProxydeckConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_baseline_upper_bound() {
        let mut config = ProxydeckConfig::default();
        config.ppx.id_baseline = MAX_ID_BASELINE;
        assert!(config.validate().is_ok());

        config.ppx.id_baseline = i64::MAX;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
