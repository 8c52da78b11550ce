//! Shared-store errors.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors.
///
/// Callers on read paths must degrade to zero/empty on any of these,
/// never to "unlimited"; write paths log and skip for the current cycle.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Operation exceeded the configured store timeout
    #[error("Store operation timed out: {operation}")]
    Timeout { operation: &'static str },

    /// Backend is unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Key exists with a different structure type
    #[error("Wrong type for key: {key}")]
    WrongType { key: String },

    /// Backend-internal failure (poisoned lock, protocol error)
    #[error("Store internal error: {0}")]
    Internal(String),
}
