//! # ep-server
//!
//! Axum server for the epeople account forms.
//!
//! This crate serves:
//! - Account administration endpoints (create, edit, delete, reset, login-as)
//! - Profile and registration endpoints
//! - Health check endpoints
//!
//! ## Architecture
//!
//! Authentication happens in a fronting proxy that names the account in a
//! trusted header. Accounts and groups live in an in-memory directory
//! seeded at startup with the administrator group and, optionally, a
//! first administrator.
//!
//! ## Usage
//!
//! ```ignore
//! use ep_server::{BootstrapConfig, Server};
//!
//! let config = ep_core::Config::from_env()?;
//! let server = Server::new(config, BootstrapConfig::from_env()).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod providers;
pub mod router;
pub mod state;

pub use config::BootstrapConfig;
pub use router::create_router;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use ep_auth::{PasswordHasherService, PasswordPolicy, TracingMailer};
use ep_core::Config;
use tokio::net::TcpListener;

use crate::providers::bootstrap_directory;

/// The epeople server.
pub struct Server {
    config: Arc<Config>,
    state: AppState,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// This builds and seeds the directory and wires the account forms.
    pub async fn new(config: Config, bootstrap: BootstrapConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let hasher = PasswordHasherService::new(
            PasswordPolicy::new().min_length(config.accounts.min_password_length),
        );

        let (directory, _) = bootstrap_directory(&config, &bootstrap, &hasher).await?;
        tracing::info!(accounts = directory.account_count(), "directory ready");

        let state = AppState::new(
            Arc::clone(&config),
            directory,
            Arc::new(TracingMailer),
            hasher,
        );
        Ok(Self { config, state })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let app = create_router(self.state)?;

        let addr: SocketAddr =
            format!("{}:{}", self.config.server.host, self.config.server.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates a router without starting the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity header is misconfigured.
    pub fn test_router(&self) -> anyhow::Result<Router> {
        Ok(create_router(self.state.clone())?)
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
