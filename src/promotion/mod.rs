//! # Promotion
//!
//! The periodic loop that moves members from the waiting queue into the
//! active set as capacity frees up. One replica drives a given resource per
//! tick (partition ownership); overlap between replicas is tolerated
//! because each per-member step is idempotent against the shared store.

pub mod runner;

pub use runner::PromotionLoop;
