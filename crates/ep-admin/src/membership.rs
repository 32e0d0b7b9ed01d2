//! Group membership resolution.
//!
//! Given an account and one of the groups it belongs to, decides whether
//! the membership is direct or names a group it is inherited through. The
//! edit form uses this to annotate each group in the "member of" list.

use std::collections::{HashMap, HashSet, VecDeque};

use ep_model::{AccountId, Group, GroupId};

/// How an account belongs to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    /// The account is listed among the group's members.
    Direct,
    /// The account is inherited through this member group of the target.
    Via(Group),
    /// No path was found within the search bounds.
    NotFound,
}

impl Membership {
    /// The intermediate group, for inherited memberships.
    #[must_use]
    pub const fn via(&self) -> Option<&Group> {
        match self {
            Self::Via(group) => Some(group),
            _ => None,
        }
    }
}

/// Groups by id, for searches deeper than one hop.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    groups: HashMap<GroupId, Group>,
}

impl GroupIndex {
    /// Looks up a group.
    #[must_use]
    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Adds or replaces a group.
    pub fn insert(&mut self, group: Group) {
        self.groups.insert(group.id, group);
    }
}

impl FromIterator<Group> for GroupIndex {
    fn from_iter<I: IntoIterator<Item = Group>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().map(|g| (g.id, g)).collect(),
        }
    }
}

/// Resolves how an account belongs to a group.
///
/// The default resolver looks one hop deep: it only considers the target's
/// direct member groups, matched against the caller-supplied closure set.
/// [`MembershipResolver::with_max_depth`] widens this to a bounded
/// breadth-first search over the nesting graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipResolver {
    max_depth: usize,
}

impl Default for MembershipResolver {
    fn default() -> Self {
        Self { max_depth: 1 }
    }
}

impl MembershipResolver {
    /// One-hop resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver following at most `max_depth` nesting edges below the
    /// target. Zero is treated as one.
    #[must_use]
    pub const fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: if max_depth == 0 { 1 } else { max_depth },
        }
    }

    /// Maximum number of nesting edges followed.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolves `account`'s membership in `target`.
    ///
    /// `closure` is every group the account belongs to, as returned by
    /// `GroupProvider::all_member_groups`. A member group of `target` that
    /// also appears in `closure` is reported; when several do, the first
    /// in `closure` order wins. Deeper searches look groups up in `closure`.
    #[must_use]
    pub fn resolve(&self, account: AccountId, target: &Group, closure: &[Group]) -> Membership {
        let index: GroupIndex = closure.iter().cloned().collect();
        self.resolve_with_index(account, target, closure, &index)
    }

    /// Like [`resolve`](Self::resolve), looking groups up in `index` when
    /// searching deeper than one hop.
    #[must_use]
    pub fn resolve_with_index(
        &self,
        account: AccountId,
        target: &Group,
        closure: &[Group],
        index: &GroupIndex,
    ) -> Membership {
        if target.has_member(account) {
            return Membership::Direct;
        }

        // Closure order decides ties, not the target's member order.
        for group in closure {
            if target.has_member_group(group.id) {
                return Membership::Via(group.clone());
            }
        }

        if self.max_depth > 1 {
            if let Some(first_hop) = self.search(account, target, closure, index) {
                return Membership::Via(first_hop);
            }
        }

        Membership::NotFound
    }

    /// Breadth-first search from the target's member groups, returning the
    /// first hop of the first path that reaches the account.
    fn search(
        &self,
        account: AccountId,
        target: &Group,
        closure: &[Group],
        index: &GroupIndex,
    ) -> Option<Group> {
        let in_closure: HashSet<GroupId> = closure.iter().map(|g| g.id).collect();
        let mut visited: HashSet<GroupId> = HashSet::from([target.id]);
        let mut queue: VecDeque<(GroupId, GroupId, usize)> = target
            .member_groups
            .iter()
            .map(|&id| (id, id, 1))
            .collect();

        while let Some((id, first_hop, depth)) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let Some(group) = index.get(id) else {
                continue;
            };

            if group.has_member(account) || in_closure.contains(&id) {
                return index.get(first_hop).cloned();
            }
            if depth < self.max_depth {
                queue.extend(
                    group
                        .member_groups
                        .iter()
                        .map(|&child| (child, first_hop, depth + 1)),
                );
            }
        }

        None
    }
}
