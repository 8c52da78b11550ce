//! turnstile - a distributed virtual waiting room
//!
//! A bounded number of members are concurrently "active" per resource;
//! everyone else waits in a strictly FIFO queue, promoted by a periodic
//! loop as capacity frees up. State lives on a shared store so any number
//! of replicas can run this code concurrently; a partitioner decides which
//! replica drives which resource's promotion.

pub mod admission;
pub mod capacity;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod expiry;
pub mod http_server;
pub mod metrics;
pub mod notify;
pub mod observability;
pub mod promotion;
pub mod scheduler;
pub mod store;
