//! Proxydeck Web API
//!
//! HTTP access to instance management and PPX profile generation.

pub mod auth;
pub mod error;
pub mod routes;
pub mod server;

pub use auth::WebUiAuth;
pub use server::{WebServer, WebServerConfig};
