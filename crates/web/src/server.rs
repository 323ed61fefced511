//! Proxydeck web server

use axum::{middleware, Router};
use proxydeck_common::{Database, InstanceRepo};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{require_bearer, BearerToken, WebUiAuth};
use crate::routes::{api_routes, public_routes, AppState};

#[derive(Clone, Debug)]
pub struct WebServerConfig {
    /// SQLite state database
    pub db_path: PathBuf,
    /// Allocation baseline for generated profiles
    pub id_baseline: i64,
    /// Authentication policy for the API.
    pub auth: WebUiAuth,
}

/// Web server
#[derive(Clone)]
pub struct WebServer {
    state: Arc<AppState>,
    token: Option<Arc<BearerToken>>,
}

impl WebServer {
    /// Create a new web server backed by the configured database
    pub fn new(cfg: WebServerConfig) -> anyhow::Result<Self> {
        let db = Database::open(&cfg.db_path)?;
        let token = cfg.auth.resolve_token();
        if token.is_none() {
            warn!("API authentication is disabled");
        }
        Ok(Self::from_repo(InstanceRepo::new(db), cfg.id_baseline, token))
    }

    pub fn from_repo(repo: InstanceRepo, id_baseline: i64, token: Option<String>) -> Self {
        Self {
            state: Arc::new(AppState { repo, id_baseline }),
            token: token.map(|t| Arc::new(BearerToken(t))),
        }
    }

    /// Create router
    pub fn router(&self) -> Router {
        let api = api_routes(self.state.clone());
        let api = match &self.token {
            Some(token) => api.route_layer(middleware::from_fn_with_state(token.clone(), require_bearer)),
            None => api,
        };

        public_routes()
            .merge(api)
            .layer(TraceLayer::new_for_http())
    }

    /// Start the server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!("Web API starting on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

pub async fn serve(addr: SocketAddr, cfg: WebServerConfig) -> anyhow::Result<()> {
    let server = WebServer::new(cfg)?;
    server.serve(addr).await
}
