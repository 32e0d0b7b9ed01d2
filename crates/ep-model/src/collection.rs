//! Collection model.
//!
//! Accounts subscribe to collections to receive a daily mail of newly
//! archived items. Only the identity and display name matter here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric collection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub u32);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Longest name shown unabridged in the subscription selector.
const MAX_NAME_CHARS: usize = 50;

/// A collection an account can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Unique identifier.
    pub id: CollectionId,
    /// Display name.
    pub name: String,
}

impl Collection {
    /// Creates a collection.
    #[must_use]
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Name for a selector option: names longer than 50 characters are cut
    /// to 47 and end in `...`.
    #[must_use]
    pub fn short_name(&self) -> String {
        if self.name.chars().count() <= MAX_NAME_CHARS {
            return self.name.clone();
        }
        let mut short: String = self.name.chars().take(MAX_NAME_CHARS - 3).collect();
        short.push_str("...");
        short
    }
}
