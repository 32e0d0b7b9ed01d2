//! Group domain model.
//!
//! Groups collect accounts and other groups. Nesting forms a directed
//! graph: a group's member groups are its children, and every account in
//! a child group is an (indirect) member of the parent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// Numeric group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A group of accounts and nested groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier.
    pub id: GroupId,
    /// Group name.
    pub name: String,
    /// Accounts that are direct members.
    pub members: Vec<AccountId>,
    /// Groups that are direct members (one nesting hop).
    pub member_groups: Vec<GroupId>,
}

impl Group {
    /// Creates a new empty group.
    #[must_use]
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: Vec::new(),
            member_groups: Vec::new(),
        }
    }

    /// Adds a direct account member.
    #[must_use]
    pub fn with_member(mut self, account: AccountId) -> Self {
        self.add_member(account);
        self
    }

    /// Adds a direct member group.
    #[must_use]
    pub fn with_member_group(mut self, group: GroupId) -> Self {
        self.add_member_group(group);
        self
    }

    /// Adds a direct account member (ignored if already present).
    pub fn add_member(&mut self, account: AccountId) {
        if !self.members.contains(&account) {
            self.members.push(account);
        }
    }

    /// Adds a direct member group (ignored if already present).
    pub fn add_member_group(&mut self, group: GroupId) {
        if !self.member_groups.contains(&group) {
            self.member_groups.push(group);
        }
    }

    /// Checks whether the account is a direct member.
    #[must_use]
    pub fn has_member(&self, account: AccountId) -> bool {
        self.members.contains(&account)
    }

    /// Checks whether the group is a direct member group.
    #[must_use]
    pub fn has_member_group(&self, group: GroupId) -> bool {
        self.member_groups.contains(&group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_creation() {
        let group = Group::new(GroupId(7), "Reviewers");

        assert_eq!(group.name, "Reviewers");
        assert!(group.members.is_empty());
        assert!(group.member_groups.is_empty());
    }

    #[test]
    fn members_are_not_duplicated() {
        let group = Group::new(GroupId(1), "Administrator")
            .with_member(AccountId(3))
            .with_member(AccountId(3))
            .with_member_group(GroupId(2))
            .with_member_group(GroupId(2));

        assert_eq!(group.members, vec![AccountId(3)]);
        assert_eq!(group.member_groups, vec![GroupId(2)]);
        assert!(group.has_member(AccountId(3)));
        assert!(group.has_member_group(GroupId(2)));
        assert!(!group.has_member(AccountId(4)));
    }
}
