//! # Shared Store
//!
//! Abstraction over the external key-value service every replica shares.
//! Correctness of the admission core relies only on the atomicity of the
//! individual primitives here (single set / sorted-set / key mutations),
//! never on multi-operation transactions.
//!
//! `MemoryStore` is the in-process reference implementation, used by tests
//! and by single-replica deployments. Production wiring layers `TimedStore`
//! over the backend so every consumer inherits the operation timeout.

pub mod errors;
pub mod memory;
pub mod shared;
pub mod timed;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use shared::{ScoredMember, SharedStore};
pub use timed::TimedStore;
