//! # Admission
//!
//! The per-resource admission state machine: an active set of admitted
//! members, a FIFO waiting queue, and per-member expiry markers, all hosted
//! on the shared store. The gate is the synchronous decision point for
//! inbound enter/leave requests.
//!
//! Core consistency invariant: a member is in at most one of
//! {active set, waiting queue} for a given resource at any time.

pub mod errors;
pub mod gate;
pub mod keys;
pub mod member;
pub mod store;

pub use errors::{AdmissionError, AdmissionResult};
pub use gate::{AdmissionGate, EnterOutcome};
pub use member::{Member, MemberError, Resource};
pub use store::AdmissionStore;
