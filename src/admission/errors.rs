//! Admission errors.

use thiserror::Error;

use super::member::MemberError;
use crate::store::StoreError;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// Admission errors.
#[derive(Debug, Clone, Error)]
pub enum AdmissionError {
    /// Shared-store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Bad composite member key read back from the store
    #[error(transparent)]
    Member(#[from] MemberError),
}
