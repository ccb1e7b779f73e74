//! Error types for cube operations.
//!
//! The error surface is deliberately small:
//!
//! - [`CubeError::InvalidLayerRequest`] is a local validation failure,
//!   raised before any scheduling state is touched.
//! - [`CubeError::Cancelled`] is cooperative cancellation of a queued or
//!   just-finished thread; it is only reported after the thread's
//!   bookkeeping and release duties are fully discharged.
//!
//! Scheduling-state corruption and deadlock are design bugs, not runtime
//! errors, and have no variant here.

use thiserror::Error;

/// Error returned by [`Cube::rotate`](crate::Cube::rotate) and
/// [`Cube::snapshot`](crate::Cube::snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CubeError {
    /// The face or layer argument is outside the cube's domain.
    #[error("invalid layer request: face {face}, layer {layer} (cube size {size})")]
    InvalidLayerRequest {
        /// The face index that was requested.
        face: usize,
        /// The layer index that was requested.
        layer: usize,
        /// The cube's layer count.
        size: usize,
    },
    /// The operation was cancelled through its [`CancelToken`](crate::CancelToken).
    #[error("operation cancelled")]
    Cancelled,
}
