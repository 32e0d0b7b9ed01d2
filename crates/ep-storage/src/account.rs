//! Account storage provider trait.

use async_trait::async_trait;
use ep_model::{Account, AccountId, DeleteConstraint};

use crate::error::StorageResult;

/// Provider for account storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Creates a new account and returns its assigned id.
    ///
    /// The `id` field of `account` is ignored.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the email is already in use.
    async fn create(&self, account: &Account) -> StorageResult<AccountId>;

    /// Updates an existing account.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the account doesn't exist and
    /// `StorageError::Duplicate` if the new email belongs to another account.
    async fn update(&self, account: &Account) -> StorageResult<()>;

    /// Deletes an account.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::DeletionConstrained` if other records still
    /// refer to the account, and `StorageError::NotFound` if it doesn't exist.
    async fn delete(&self, id: AccountId) -> StorageResult<()>;

    /// Gets an account by id.
    async fn get_by_id(&self, id: AccountId) -> StorageResult<Option<Account>>;

    /// Gets an account by email. Matching ignores case.
    async fn get_by_email(&self, email: &str) -> StorageResult<Option<Account>>;

    /// Lists the references that currently block deleting the account.
    ///
    /// An empty list means the account can be deleted.
    async fn delete_constraints(&self, id: AccountId) -> StorageResult<Vec<DeleteConstraint>>;
}
