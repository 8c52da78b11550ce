//! # Observability
//!
//! Structured logging for the waiting-room service.
//!
//! - One log line = one event, JSON, deterministic key ordering
//! - Synchronous writes, no buffering
//! - Severity filtering via a process-wide minimum level

pub mod logger;

pub use logger::{Logger, Severity};
