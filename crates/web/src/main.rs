use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use proxydeck_common::ProxydeckConfig;
use proxydeck_web::{WebServerConfig, WebUiAuth};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::var_os("PROXYDECK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(proxydeck_common::default_config_path);
    let config = ProxydeckConfig::load(&config_path)?;

    let web_addr: SocketAddr = std::env::var("PROXYDECK_WEB_ADDR")
        .unwrap_or_else(|_| config.web.listen.clone())
        .parse()?;

    let db_path = std::env::var_os("PROXYDECK_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.db_path());

    // Auth config
    // - PROXYDECK_WEB_AUTH=none disables the token gate.
    // - Otherwise, use a static token (PROXYDECK_WEB_AUTH_TOKEN) or DevRandom.
    let auth = match std::env::var("PROXYDECK_WEB_AUTH").ok().as_deref() {
        Some("none") => WebUiAuth::None,
        _ => match std::env::var("PROXYDECK_WEB_AUTH_TOKEN") {
            Ok(token) if !token.trim().is_empty() => WebUiAuth::Token(token),
            _ => WebUiAuth::DevRandom,
        },
    };

    let cfg = WebServerConfig {
        db_path,
        id_baseline: config.ppx.id_baseline,
        auth,
    };

    info!(
        "Starting Proxydeck web API on http://{} (db: {})",
        web_addr,
        cfg.db_path.display()
    );

    proxydeck_web::server::serve(web_addr, cfg).await
}
