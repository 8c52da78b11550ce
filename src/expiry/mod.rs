//! # Expiry
//!
//! The periodic sweep that evicts active members whose session has timed
//! out. Marker existence, not set membership, is authoritative: a member
//! whose TTL marker is gone is expired even if the active set still lists
//! it.

pub mod sweeper;

pub use sweeper::ExpirySweeper;
