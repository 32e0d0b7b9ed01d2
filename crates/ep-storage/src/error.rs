//! Storage error types.

use ep_model::DeleteConstraint;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity (e.g., "Account", "Group").
        entity_type: &'static str,
        /// Entity ID.
        id: String,
    },

    /// Duplicate entity (unique constraint violation).
    #[error("Duplicate {entity_type}: {field} '{value}' already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Field that caused the conflict.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// The entity is still referenced and cannot be deleted.
    #[error("{entity_type} {id} cannot be deleted: referenced by {}", join_constraints(.constraints))]
    DeletionConstrained {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity ID.
        id: String,
        /// The references that block deletion.
        constraints: Vec<DeleteConstraint>,
    },

    /// Invalid data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Backend connection error.
    #[error("Storage connection error: {0}")]
    Connection(String),

    /// Internal error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

fn join_constraints(constraints: &[DeleteConstraint]) -> String {
    constraints
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl StorageError {
    /// Creates a not found error for an entity.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(
        entity_type: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            entity_type,
            field,
            value: value.into(),
        }
    }

    /// Creates a deletion constraint error.
    #[must_use]
    pub fn constrained(
        entity_type: &'static str,
        id: impl ToString,
        constraints: Vec<DeleteConstraint>,
    ) -> Self {
        Self::DeletionConstrained {
            entity_type,
            id: id.to_string(),
            constraints,
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Checks if this is a deletion constraint error.
    #[must_use]
    pub const fn is_constrained(&self) -> bool {
        matches!(self, Self::DeletionConstrained { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
