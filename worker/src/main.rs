use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker::api;
use worker::{ServerConfig, SessionRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,worker=debug")),
        )
        .init();

    info!("=== Reveal Worker Starting ===");

    let config = ServerConfig::from_env()?;
    info!(host = %config.host, port = config.port, "configuration loaded");

    let registry = SessionRegistry::new();
    api::start_api_server(config.bind_addr(), registry).await?;

    info!("=== Reveal Worker Stopped ===");
    Ok(())
}
