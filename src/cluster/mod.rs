//! # Cluster
//!
//! Replica liveness and partition ownership. Each replica heartbeats a
//! record into the shared store; every replica independently derives the
//! same ownership answer from the same record snapshot, with no central
//! coordinator.

pub mod partitioner;
pub mod tracker;

pub use partitioner::{PartitionStrategy, Partitioner};
pub use tracker::{ReplicaLoadTracker, ReplicaRecord};
