//! Authentication error types.

use ep_storage::StorageError;
use thiserror::Error;

/// Authentication operation errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials provided.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The caller may not perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The referenced account does not exist.
    #[error("account {0} not found")]
    AccountNotFound(String),

    /// Mailed token is unknown, already used or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The impersonation session is unknown or has lapsed.
    #[error("impersonation session {0} not found")]
    SessionNotFound(String),

    /// Password does not satisfy the policy.
    #[error("password rejected: {0}")]
    WeakPassword(String),

    /// Mail delivery failed.
    #[error("mail delivery failed: {0}")]
    Mail(String),

    /// Underlying storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal error.
    #[error("internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Checks if this is an authorization refusal.
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");

        let err = AuthError::forbidden("administrators cannot be impersonated");
        assert!(err.is_forbidden());
        assert_eq!(err.to_string(), "administrators cannot be impersonated");
    }

    #[test]
    fn storage_errors_pass_through() {
        let err: AuthError = StorageError::not_found("Account", 3).into();
        assert!(!err.is_forbidden());
        assert!(err.to_string().contains("Account"));
    }
}
