//! Application state management.
//!
//! This module defines the shared state that is passed to all request handlers.

use std::sync::Arc;

use ep_admin::AdminState;
use ep_auth::{DirectoryAuthService, Mailer, PasswordHasherService};
use ep_core::Config;
use ep_storage::InMemoryDirectory;

/// Account form state over the in-memory directory.
pub type DirectoryAdminState = AdminState<InMemoryDirectory, InMemoryDirectory>;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Account directory.
    pub directory: Arc<InMemoryDirectory>,

    /// State of the account forms.
    pub admin: DirectoryAdminState,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        config: Arc<Config>,
        directory: Arc<InMemoryDirectory>,
        mailer: Arc<dyn Mailer>,
        hasher: PasswordHasherService,
    ) -> Self {
        let auth = DirectoryAuthService::new(
            Arc::clone(&directory),
            Arc::clone(&directory),
            mailer,
            &config,
        )
        .with_hasher(hasher);
        let admin = AdminState::new(
            Arc::clone(&directory),
            Arc::clone(&directory),
            Arc::clone(&directory) as _,
            Arc::new(auth),
            Arc::clone(&config),
        );
        Self {
            config,
            directory,
            admin,
        }
    }

    /// Gets the state for the account form routes.
    pub fn admin_state(&self) -> DirectoryAdminState {
        self.admin.clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
