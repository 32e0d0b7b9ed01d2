//! Provider wiring for the server.
//!
//! The server runs on the [`InMemoryDirectory`]; this module seeds it with
//! the administrator group, the configured collections and, when
//! configured, a first administrator.

use std::sync::Arc;

use ep_auth::PasswordHasherService;
use ep_core::{Config, Error, Result};
use ep_model::{Account, AccountId, Collection, CollectionId, Group, GroupId};
use ep_storage::{AccountProvider, GroupProvider, InMemoryDirectory};

use crate::config::BootstrapConfig;

/// Creates the directory and seeds it.
///
/// Returns the directory and the seeded administrator, if any.
///
/// # Errors
///
/// Returns [`Error::Bootstrap`] if seeding fails.
pub async fn bootstrap_directory(
    config: &Config,
    bootstrap: &BootstrapConfig,
    hasher: &PasswordHasherService,
) -> Result<(Arc<InMemoryDirectory>, Option<AccountId>)> {
    let directory = Arc::new(InMemoryDirectory::new());
    let group_id = GroupId(config.accounts.admin_group_id);

    GroupProvider::create(
        directory.as_ref(),
        &Group::new(group_id, bootstrap.admin_group_name.clone()),
    )
    .await
    .map_err(|e| Error::Bootstrap(e.to_string()))?;

    for (id, name) in (1..).zip(&bootstrap.collections) {
        directory.add_collection(Collection::new(CollectionId(id), name.clone()));
    }

    let Some(email) = bootstrap.admin_email.as_deref() else {
        tracing::warn!("no bootstrap administrator configured");
        return Ok((directory, None));
    };

    let mut admin = Account::new(email)
        .with_first_name(bootstrap.admin_first_name.clone())
        .with_last_name(bootstrap.admin_last_name.clone())
        .with_can_log_in(true);
    if let Some(password) = bootstrap.admin_password.as_deref() {
        admin.password_hash = Some(
            hasher
                .hash(password)
                .map_err(|e| Error::Bootstrap(e.to_string()))?,
        );
    }

    let id = AccountProvider::create(directory.as_ref(), &admin)
        .await
        .map_err(|e| Error::Bootstrap(e.to_string()))?;
    directory
        .add_member(group_id, id)
        .await
        .map_err(|e| Error::Bootstrap(e.to_string()))?;

    tracing::info!(account_id = %id, email = %email, "bootstrap administrator created");
    Ok((directory, Some(id)))
}
