//! Error handling for epeople.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for epeople.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Bootstrap error (seeding the initial administrator, binding, etc.).
    #[error("bootstrap error: {0}")]
    Bootstrap(String),
}
