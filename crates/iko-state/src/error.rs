//! Error types for ownership state operations.

use thiserror::Error;

/// Errors that can occur during ownership state operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The backing store's lock was poisoned by a panicking writer.
    #[error("state lock poisoned: {0}")]
    Poisoned(String),

    /// The backend refused or failed the operation.
    #[error("state backend error: {0}")]
    Backend(String),
}

/// Convenience type alias for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
