//! Group storage provider trait.

use async_trait::async_trait;
use ep_model::{AccountId, Group, GroupId};

use crate::error::StorageResult;

/// Provider for group storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait GroupProvider: Send + Sync {
    /// Creates a new group.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a group with the same id exists.
    async fn create(&self, group: &Group) -> StorageResult<()>;

    /// Gets a group by id.
    async fn get_by_id(&self, id: GroupId) -> StorageResult<Option<Group>>;

    /// Adds an account as a direct member of a group.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the group doesn't exist.
    async fn add_member(&self, group_id: GroupId, account_id: AccountId) -> StorageResult<()>;

    /// Nests `child` inside `parent`.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if either group doesn't exist.
    async fn add_member_group(&self, parent: GroupId, child: GroupId) -> StorageResult<()>;

    /// Gets the accounts that are direct members of a group.
    async fn get_members(&self, group_id: GroupId) -> StorageResult<Vec<AccountId>>;

    /// Gets the groups that are direct members of a group (one hop).
    async fn get_member_groups(&self, group_id: GroupId) -> StorageResult<Vec<Group>>;

    /// Gets every group the account belongs to, directly or through nesting.
    ///
    /// Groups the account is a direct member of come first, followed by
    /// their ancestors in breadth-first order. Each group appears once.
    async fn all_member_groups(&self, account_id: AccountId) -> StorageResult<Vec<Group>>;

    /// Checks whether the account belongs to the group, directly or through nesting.
    async fn is_member(&self, group_id: GroupId, account_id: AccountId) -> StorageResult<bool> {
        Ok(self
            .all_member_groups(account_id)
            .await?
            .iter()
            .any(|g| g.id == group_id))
    }
}
