//! Error types for Proxydeck

use thiserror::Error;

/// Result type alias using Proxydeck Error
pub type Result<T> = std::result::Result<T, Error>;

/// Proxydeck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Template error: {0}")]
    Template(String),

    /// The record already carries a ppx id, or vanished, between fetch and write-back.
    #[error("ppx id {ppx_proxy_id} could not be assigned to instance {instance_id}")]
    AllocationConflict {
        instance_id: String,
        ppx_proxy_id: i64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn instance_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "instance".to_string(),
            id: id.into(),
        }
    }
}
