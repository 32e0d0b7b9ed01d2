//! Error types for the account forms.
//!
//! Validation problems never surface here; they are reported through
//! [`FlowResult`](crate::flow::FlowResult). These errors cover missing
//! records, refused access and collaborator failures, and map to HTTP
//! responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ep_auth::AuthError;
use ep_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the account flows and views.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Resource not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        /// Type of entity (e.g., "Account", "Group").
        entity_type: &'static str,
        /// Resource identifier.
        id: String,
    },

    /// Invalid request data.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication required.
    #[error("Authentication required")]
    Unauthorized,

    /// Insufficient permissions.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Storage layer error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Authentication service error.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Storage(err) => storage_status(err),
            Self::Auth(err) => match err {
                AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountNotFound(_) | AuthError::SessionNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                AuthError::InvalidToken | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Mail(_) => StatusCode::BAD_GATEWAY,
                AuthError::Storage(inner) => storage_status(inner),
                AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Storage(_) => "storage_error",
            Self::Auth(_) => "auth_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

const fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
        StorageError::Duplicate { .. } | StorageError::DeletionConstrained { .. } => {
            StatusCode::CONFLICT
        }
        StorageError::InvalidData(_) => StatusCode::BAD_REQUEST,
        StorageError::Connection(_) | StorageError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for the account flows.
pub type AdminResult<T> = Result<T, AdminError>;
