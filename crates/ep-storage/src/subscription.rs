//! Subscription storage provider trait.

use async_trait::async_trait;
use ep_model::{AccountId, Collection, CollectionId};

use crate::error::StorageResult;

/// Provider for collection subscriptions.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    /// Lists every collection, ordered by id.
    async fn list_collections(&self) -> StorageResult<Vec<Collection>>;

    /// Lists the collections the account is subscribed to, ordered by id.
    async fn subscriptions(&self, account_id: AccountId) -> StorageResult<Vec<Collection>>;

    /// Subscribes the account to a collection. Subscribing twice is a no-op.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the collection doesn't exist.
    async fn subscribe(&self, account_id: AccountId, collection: CollectionId)
        -> StorageResult<()>;

    /// Removes a subscription if present.
    async fn unsubscribe(&self, account_id: AccountId, collection: CollectionId)
        -> StorageResult<()>;
}
