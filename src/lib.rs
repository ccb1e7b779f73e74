//! Concurrent cube: a shared rotating puzzle with a cancel-correct
//! admission scheduler.
//!
//! Many independent OS threads mutate and read one cube through two
//! operation kinds: a **rotation** (one physical layer, one quarter turn)
//! and a **snapshot** (the full state). The crate's core is the protocol
//! that decides when each thread may enter its operation body:
//!
//! - Rotations about the same axis run concurrently on distinct layers;
//!   rotations about different axes never overlap; snapshots run
//!   concurrently with each other but never with a rotation.
//! - Waiting threads are admitted in batches through a baton-passing
//!   cascade: one hand-off chain starts an entire compatible cohort, and
//!   an idle-to-busy transition selects the next group round-robin, so no
//!   group starves.
//! - Cancellation is a first-class protocol: a queued thread withdraws
//!   cleanly, a thread handed an admission discharges the hand-off before
//!   reporting, and an admitted thread always runs its body and hooks to
//!   completion. `before`/`after` hook counts match at every instant.
//!
//! # Example
//!
//! ```
//! use concurrent_cube::{CancelToken, Cube};
//!
//! let cube = Cube::new(3);
//! let cancel = CancelToken::new();
//! cube.rotate(0, 0, &cancel)?;
//! let view = cube.snapshot(&cancel)?;
//! assert_eq!(view.sticker(1, 0, 0), 2);
//! # Ok::<(), concurrent_cube::CubeError>(())
//! ```
//!
//! # Module Structure
//!
//! - [`layer`]: canonical layer identity resolution
//! - [`cancel`]: cooperative cancellation tokens
//! - [`hooks`]: injected before/after operation hooks
//! - [`view`]: snapshot state views
//! - [`error`]: error types
//! - [`cube`]: the facade tying scheduler, hooks and geometry together
//! - [`test_utils`]: tracing-based test logging and instrumented hooks

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod cube;
pub mod error;
mod face;
pub mod hooks;
pub mod layer;
mod sched;
pub mod test_utils;
pub mod view;

pub use cancel::CancelToken;
pub use cube::Cube;
pub use error::CubeError;
pub use hooks::{Hooks, NoopHooks};
pub use layer::{resolve, Group, LayerKey};
pub use view::StateView;
