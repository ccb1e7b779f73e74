//! Caller-supplied operation hooks.
//!
//! The scheduler invokes each hook exactly once per admitted operation,
//! synchronously on the operating thread, bracketing the opaque body:
//! `before_rotation` / mutation / `after_rotation` for twists and
//! `before_snapshot` / read / `after_snapshot` for snapshots. Cancellation
//! never splits a pair: either the whole body runs or none of it does.
//!
//! Hooks run outside the scheduler lock and may take arbitrary time, but
//! must not call back into the same cube.

/// Strategy object bracketing every admitted operation.
pub trait Hooks: Send + Sync {
    /// Called before a rotation body, with the raw requested face and layer.
    fn before_rotation(&self, face: usize, layer: usize) {
        let _ = (face, layer);
    }

    /// Called after a rotation body completed.
    fn after_rotation(&self, face: usize, layer: usize) {
        let _ = (face, layer);
    }

    /// Called before a snapshot body.
    fn before_snapshot(&self) {}

    /// Called after a snapshot body completed.
    fn after_snapshot(&self) {}
}

/// Hooks that do nothing; the default for [`Cube::new`](crate::Cube::new).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl Hooks for NoopHooks {}
