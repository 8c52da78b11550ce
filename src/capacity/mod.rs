//! # Capacity
//!
//! Turns the live replica count into the global admission ceiling. The
//! calculator is consulted on every decision (no caching), so a scale-out
//! or scale-in is reflected within one promotion cycle.

pub mod calculator;
pub mod discovery;

pub use calculator::CapacityCalculator;
pub use discovery::{DiscoveryError, DiscoveryResult, ReplicaDiscovery};
