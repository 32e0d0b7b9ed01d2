//! Deletion constraints.
//!
//! An account that other records still refer to cannot be deleted. The
//! store reports which kinds of references exist so the forms can explain
//! why the delete action is unavailable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A referential dependency that blocks deleting an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteConstraint {
    /// The account submitted archived items.
    Item,
    /// The account owns in-progress workflow items.
    WorkflowItem,
    /// The account has entries in a reviewer task list.
    TaskListItem,
    /// A reference the forms have no specific wording for.
    Other(String),
}

impl DeleteConstraint {
    /// Parses the store's table-style constraint name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "item" => Self::Item,
            "workflowitem" => Self::WorkflowItem,
            "tasklistitem" => Self::TaskListItem,
            other => Self::Other(other.to_string()),
        }
    }

    /// Message key used when listing this constraint.
    #[must_use]
    pub const fn message_key(&self) -> &'static str {
        match self {
            Self::Item => "admin.epeople.delete_constraint.item",
            Self::WorkflowItem => "admin.epeople.delete_constraint.workflow_item",
            Self::TaskListItem => "admin.epeople.delete_constraint.task_list_item",
            Self::Other(_) => "admin.epeople.delete_constraint.unknown",
        }
    }
}

impl fmt::Display for DeleteConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item => f.write_str("item"),
            Self::WorkflowItem => f.write_str("workflowitem"),
            Self::TaskListItem => f.write_str("tasklistitem"),
            Self::Other(name) => f.write_str(name),
        }
    }
}
