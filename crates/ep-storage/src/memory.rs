//! In-memory directory.
//!
//! Implements [`AccountProvider`], [`GroupProvider`] and
//! [`SubscriptionProvider`] over maps guarded by `parking_lot` locks. Every
//! call is atomic on its own; nothing spans calls. Used by the tests and by the demo server.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use ep_model::{Account, AccountId, Collection, CollectionId, DeleteConstraint, Group, GroupId};
use parking_lot::RwLock;

use crate::account::AccountProvider;
use crate::error::{StorageError, StorageResult};
use crate::group::GroupProvider;
use crate::subscription::SubscriptionProvider;

/// Accounts and groups held in memory.
#[derive(Debug)]
pub struct InMemoryDirectory {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
    groups: RwLock<BTreeMap<GroupId, Group>>,
    references: RwLock<HashMap<AccountId, Vec<DeleteConstraint>>>,
    collections: RwLock<BTreeMap<CollectionId, Collection>>,
    subscriptions: RwLock<HashMap<AccountId, BTreeSet<CollectionId>>>,
    next_account_id: AtomicU32,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            groups: RwLock::new(BTreeMap::new()),
            references: RwLock::new(HashMap::new()),
            collections: RwLock::new(BTreeMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            next_account_id: AtomicU32::new(1),
        }
    }
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reference to the account that blocks its deletion
    /// (an authored item, a workflow item, a task-list entry).
    pub fn add_reference(&self, account_id: AccountId, constraint: DeleteConstraint) {
        let mut references = self.references.write();
        let entry = references.entry(account_id).or_default();
        if !entry.contains(&constraint) {
            entry.push(constraint);
        }
    }

    /// Removes every reference to the account.
    pub fn clear_references(&self, account_id: AccountId) {
        self.references.write().remove(&account_id);
    }

    /// Returns the number of stored accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    /// Adds or renames a collection.
    pub fn add_collection(&self, collection: Collection) {
        self.collections.write().insert(collection.id, collection);
    }
}

fn email_owner(accounts: &BTreeMap<AccountId, Account>, email: &str) -> Option<AccountId> {
    accounts.values().find(|a| a.has_email(email)).map(|a| a.id)
}

#[async_trait]
impl AccountProvider for InMemoryDirectory {
    async fn create(&self, account: &Account) -> StorageResult<AccountId> {
        let mut accounts = self.accounts.write();
        if email_owner(&accounts, &account.email).is_some() {
            return Err(StorageError::duplicate("Account", "email", &account.email));
        }

        let id = AccountId(self.next_account_id.fetch_add(1, Ordering::SeqCst));
        let mut stored = account.clone();
        stored.id = id;
        accounts.insert(id, stored);
        drop(accounts);

        tracing::debug!(account_id = %id, "account stored");
        Ok(id)
    }

    async fn update(&self, account: &Account) -> StorageResult<()> {
        let mut accounts = self.accounts.write();
        if email_owner(&accounts, &account.email).is_some_and(|owner| owner != account.id) {
            return Err(StorageError::duplicate("Account", "email", &account.email));
        }

        let stored = accounts
            .get_mut(&account.id)
            .ok_or_else(|| StorageError::not_found("Account", account.id))?;
        *stored = account.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: AccountId) -> StorageResult<()> {
        let constraints = self.delete_constraints(id).await?;
        if !constraints.is_empty() {
            return Err(StorageError::constrained("Account", id, constraints));
        }

        if self.accounts.write().remove(&id).is_none() {
            return Err(StorageError::not_found("Account", id));
        }
        for group in self.groups.write().values_mut() {
            group.members.retain(|m| *m != id);
        }
        self.subscriptions.write().remove(&id);

        tracing::debug!(account_id = %id, "account removed");
        Ok(())
    }

    async fn get_by_id(&self, id: AccountId) -> StorageResult<Option<Account>> {
        Ok(self.accounts.read().get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> StorageResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .values()
            .find(|a| a.has_email(email))
            .cloned())
    }

    async fn delete_constraints(&self, id: AccountId) -> StorageResult<Vec<DeleteConstraint>> {
        Ok(self.references.read().get(&id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl GroupProvider for InMemoryDirectory {
    async fn create(&self, group: &Group) -> StorageResult<()> {
        let mut groups = self.groups.write();
        if groups.contains_key(&group.id) {
            return Err(StorageError::duplicate("Group", "id", group.id.to_string()));
        }
        groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: GroupId) -> StorageResult<Option<Group>> {
        Ok(self.groups.read().get(&id).cloned())
    }

    async fn add_member(&self, group_id: GroupId, account_id: AccountId) -> StorageResult<()> {
        self.groups
            .write()
            .get_mut(&group_id)
            .ok_or_else(|| StorageError::not_found("Group", group_id))?
            .add_member(account_id);
        Ok(())
    }

    async fn add_member_group(&self, parent: GroupId, child: GroupId) -> StorageResult<()> {
        let mut groups = self.groups.write();
        if !groups.contains_key(&child) {
            return Err(StorageError::not_found("Group", child));
        }
        groups
            .get_mut(&parent)
            .ok_or_else(|| StorageError::not_found("Group", parent))?
            .add_member_group(child);
        Ok(())
    }

    async fn get_members(&self, group_id: GroupId) -> StorageResult<Vec<AccountId>> {
        Ok(self
            .groups
            .read()
            .get(&group_id)
            .map(|g| g.members.clone())
            .unwrap_or_default())
    }

    async fn get_member_groups(&self, group_id: GroupId) -> StorageResult<Vec<Group>> {
        let groups = self.groups.read();
        Ok(groups
            .get(&group_id)
            .map(|g| {
                g.member_groups
                    .iter()
                    .filter_map(|id| groups.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn all_member_groups(&self, account_id: AccountId) -> StorageResult<Vec<Group>> {
        let groups = self.groups.read();

        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<GroupId> = groups
            .values()
            .filter(|g| g.has_member(account_id))
            .map(|g| g.id)
            .collect();

        // Walk up the nesting graph; `seen` also stops cycles.
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            queue.extend(
                groups
                    .values()
                    .filter(|parent| parent.has_member_group(id))
                    .map(|parent| parent.id),
            );
        }

        Ok(order
            .into_iter()
            .filter_map(|id| groups.get(&id).cloned())
            .collect())
    }
}

#[async_trait]
impl SubscriptionProvider for InMemoryDirectory {
    async fn list_collections(&self) -> StorageResult<Vec<Collection>> {
        Ok(self.collections.read().values().cloned().collect())
    }

    async fn subscriptions(&self, account_id: AccountId) -> StorageResult<Vec<Collection>> {
        let collections = self.collections.read();
        Ok(self
            .subscriptions
            .read()
            .get(&account_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| collections.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn subscribe(
        &self,
        account_id: AccountId,
        collection: CollectionId,
    ) -> StorageResult<()> {
        if !self.collections.read().contains_key(&collection) {
            return Err(StorageError::not_found("Collection", collection));
        }
        self.subscriptions
            .write()
            .entry(account_id)
            .or_default()
            .insert(collection);
        Ok(())
    }

    async fn unsubscribe(
        &self,
        account_id: AccountId,
        collection: CollectionId,
    ) -> StorageResult<()> {
        let mut subscriptions = self.subscriptions.write();
        if let Some(ids) = subscriptions.get_mut(&account_id) {
            ids.remove(&collection);
            if ids.is_empty() {
                subscriptions.remove(&account_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn account(email: &str) -> Account {
        Account::new(email).with_first_name("Ana").with_last_name("Ruiz")
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let dir = InMemoryDirectory::new();

        let first = AccountProvider::create(&dir, &account("a@example.org")).await.unwrap();
        let second = AccountProvider::create(&dir, &account("b@example.org")).await.unwrap();

        assert_eq!(first, AccountId(1));
        assert_eq!(second, AccountId(2));
        assert_eq!(dir.account_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_ignoring_case() {
        let dir = InMemoryDirectory::new();
        AccountProvider::create(&dir, &account("ana@example.org")).await.unwrap();

        let err = AccountProvider::create(&dir, &account("ANA@example.org"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        let found = dir.get_by_email("Ana@Example.Org").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_account() {
        let dir = InMemoryDirectory::new();
        AccountProvider::create(&dir, &account("a@example.org")).await.unwrap();
        let id = AccountProvider::create(&dir, &account("b@example.org")).await.unwrap();

        let mut b = AccountProvider::get_by_id(&dir, id).await.unwrap().unwrap();
        b.email = "a@example.org".to_string();
        assert!(dir.update(&b).await.unwrap_err().is_duplicate());
    }

    #[tokio::test]
    async fn concurrent_creates_with_one_email_store_one_account() {
        let dir = Arc::new(InMemoryDirectory::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let dir = Arc::clone(&dir);
                tokio::spawn(async move {
                    AccountProvider::create(dir.as_ref(), &account("same@example.org")).await
                })
            })
            .collect();

        let mut stored = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => stored += 1,
                Err(err) => assert!(err.is_duplicate()),
            }
        }
        assert_eq!(stored, 1);
        assert_eq!(dir.account_count(), 1);
    }

    #[tokio::test]
    async fn update_missing_account_is_not_found() {
        let dir = InMemoryDirectory::new();
        let mut ghost = account("ghost@example.org");
        ghost.id = AccountId(99);

        assert!(dir.update(&ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_reports_constraints() {
        let dir = InMemoryDirectory::new();
        let id = AccountProvider::create(&dir, &account("a@example.org")).await.unwrap();
        dir.add_reference(id, DeleteConstraint::Item);
        dir.add_reference(id, DeleteConstraint::Item);

        let err = AccountProvider::delete(&dir, id).await.unwrap_err();
        match err {
            StorageError::DeletionConstrained { constraints, .. } => {
                assert_eq!(constraints, vec![DeleteConstraint::Item]);
            }
            other => panic!("unexpected error: {other}"),
        }

        dir.clear_references(id);
        AccountProvider::delete(&dir, id).await.unwrap();
        assert!(AccountProvider::get_by_id(&dir, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_group_memberships() {
        let dir = InMemoryDirectory::new();
        let id = AccountProvider::create(&dir, &account("a@example.org")).await.unwrap();
        GroupProvider::create(&dir, &Group::new(GroupId(1), "Readers").with_member(id))
            .await
            .unwrap();

        AccountProvider::delete(&dir, id).await.unwrap();
        assert!(dir.get_members(GroupId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closure_lists_direct_groups_then_ancestors() {
        let dir = InMemoryDirectory::new();
        let id = AccountId(5);
        GroupProvider::create(&dir, &Group::new(GroupId(1), "Administrator"))
            .await
            .unwrap();
        GroupProvider::create(&dir, &Group::new(GroupId(2), "Editors"))
            .await
            .unwrap();
        GroupProvider::create(&dir, &Group::new(GroupId(3), "Copy editors").with_member(id))
            .await
            .unwrap();
        GroupProvider::create(&dir, &Group::new(GroupId(4), "Readers").with_member(id))
            .await
            .unwrap();
        dir.add_member_group(GroupId(2), GroupId(3)).await.unwrap();
        dir.add_member_group(GroupId(1), GroupId(2)).await.unwrap();

        let closure: Vec<GroupId> = dir
            .all_member_groups(id)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();

        assert_eq!(closure, vec![GroupId(3), GroupId(4), GroupId(2), GroupId(1)]);
        assert!(dir.is_member(GroupId(1), id).await.unwrap());
        assert!(!dir.is_member(GroupId(1), AccountId(6)).await.unwrap());
    }

    #[tokio::test]
    async fn closure_survives_nesting_cycles() {
        let dir = InMemoryDirectory::new();
        let id = AccountId(1);
        GroupProvider::create(&dir, &Group::new(GroupId(1), "A").with_member(id))
            .await
            .unwrap();
        GroupProvider::create(&dir, &Group::new(GroupId(2), "B"))
            .await
            .unwrap();
        dir.add_member_group(GroupId(2), GroupId(1)).await.unwrap();
        dir.add_member_group(GroupId(1), GroupId(2)).await.unwrap();

        let closure = dir.all_member_groups(id).await.unwrap();
        assert_eq!(closure.len(), 2);
    }

    #[tokio::test]
    async fn nesting_unknown_group_is_not_found() {
        let dir = InMemoryDirectory::new();
        GroupProvider::create(&dir, &Group::new(GroupId(1), "A"))
            .await
            .unwrap();

        let err = dir.add_member_group(GroupId(1), GroupId(9)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn subscriptions_follow_subscribe_and_unsubscribe() {
        let dir = InMemoryDirectory::new();
        let id = AccountProvider::create(&dir, &account("a@example.org")).await.unwrap();
        dir.add_collection(Collection::new(CollectionId(2), "Theses"));
        dir.add_collection(Collection::new(CollectionId(1), "Articles"));

        dir.subscribe(id, CollectionId(2)).await.unwrap();
        dir.subscribe(id, CollectionId(1)).await.unwrap();
        dir.subscribe(id, CollectionId(1)).await.unwrap();
        let names: Vec<String> = dir
            .subscriptions(id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Articles", "Theses"]);

        dir.unsubscribe(id, CollectionId(1)).await.unwrap();
        dir.unsubscribe(id, CollectionId(7)).await.unwrap();
        assert_eq!(dir.subscriptions(id).await.unwrap().len(), 1);
        assert_eq!(dir.list_collections().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn subscribing_to_unknown_collection_is_not_found() {
        let dir = InMemoryDirectory::new();

        let err = dir.subscribe(AccountId(1), CollectionId(9)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn deleting_account_drops_its_subscriptions() {
        let dir = InMemoryDirectory::new();
        let id = AccountProvider::create(&dir, &account("a@example.org")).await.unwrap();
        dir.add_collection(Collection::new(CollectionId(1), "Articles"));
        dir.subscribe(id, CollectionId(1)).await.unwrap();

        AccountProvider::delete(&dir, id).await.unwrap();
        assert!(dir.subscriptions(id).await.unwrap().is_empty());
    }
}
