//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from build and I/O errors.

use super::{InvalidFeedScopedId, StopIndex, TimeError};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Coordinate outside the WGS84 ranges
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(&'static str),

    /// Malformed entity id
    #[error(transparent)]
    InvalidId(#[from] InvalidFeedScopedId),

    /// Malformed time
    #[error(transparent)]
    InvalidTime(#[from] TimeError),

    /// Stop index does not exist in this network
    #[error("stop index {index} out of range (network has {stop_count} stops)")]
    StopIndexOutOfRange { index: StopIndex, stop_count: usize },
}
