//! # epeople server
//!
//! Main entry point for the epeople server.

#![forbid(unsafe_code)]

use ep_core::Config;
use ep_server::{BootstrapConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads .env before the tracing filter looks at RUST_LOG
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        assume_login = config.ui.assume_login,
        edit_metadata = config.ui.edit_metadata,
        "epeople starting"
    );

    let server = Server::new(config, BootstrapConfig::from_env()).await?;
    server.run().await
}
