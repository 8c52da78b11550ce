//! Notification errors.

use thiserror::Error;

/// Result type for notification delivery.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Notification errors. These never cross a relay boundary; the relay
/// absorbs them into a log line and a failure counter.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// Transport refused or dropped the message
    #[error("Transport rejected publish to {topic}: {reason}")]
    Transport { topic: String, reason: String },

    /// Payload could not be serialized
    #[error("Cannot serialize payload: {0}")]
    Serialize(String),
}
