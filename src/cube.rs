//! The concurrent cube facade.
//!
//! Wires the layer resolver, the admission scheduler, the caller's hooks
//! and the geometry together. The geometry itself is a fixed sequence of
//! strip copies per face; all interesting behavior is in [`crate::sched`].

use std::fmt;

use crate::cancel::CancelToken;
use crate::error::CubeError;
use crate::face::Face;
use crate::hooks::{Hooks, NoopHooks};
use crate::layer::resolve;
use crate::sched::Scheduler;
use crate::view::StateView;

const TOP: usize = 0;
const LEFT: usize = 1;
const FRONT: usize = 2;
const RIGHT: usize = 3;
const BACK: usize = 4;
const BOTTOM: usize = 5;

/// A shared cube that many threads rotate and read concurrently.
///
/// All methods take `&self`; the admission protocol provides the exclusion
/// the bodies rely on. Construction allocates every scheduling structure
/// up front; operations allocate only local strip buffers.
pub struct Cube<H: Hooks = NoopHooks> {
    size: usize,
    hooks: H,
    sched: Scheduler,
    faces: [Face; 6],
}

impl Cube<NoopHooks> {
    /// Creates a solved cube with `size` layers and no-op hooks.
    ///
    /// # Panics
    ///
    /// Panics when `size == 0`.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self::with_hooks(size, NoopHooks)
    }
}

impl<H: Hooks> Cube<H> {
    /// Creates a solved cube with `size` layers and the given hooks.
    ///
    /// # Panics
    ///
    /// Panics when `size == 0`.
    #[must_use]
    pub fn with_hooks(size: usize, hooks: H) -> Self {
        assert!(size > 0, "cube must have at least one layer");
        let faces = std::array::from_fn(|face| Face::new(size, face as u8));
        Self {
            size,
            hooks,
            sched: Scheduler::new(size),
            faces,
        }
    }

    /// The cube's layer count.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Rotates one layer a quarter turn clockwise as seen from `face`.
    ///
    /// Blocks until the scheduler admits the operation, then runs
    /// `before_rotation`, the mutation and `after_rotation` in order,
    /// exactly once each.
    ///
    /// # Errors
    ///
    /// [`CubeError::InvalidLayerRequest`] for out-of-range arguments, before
    /// any scheduling state is touched. [`CubeError::Cancelled`] when
    /// `cancel` fires while queued (the body never runs) or is pending when
    /// the body completes (the body ran fully).
    pub fn rotate(&self, face: usize, layer: usize, cancel: &CancelToken) -> Result<(), CubeError> {
        let key = resolve(face, layer, self.size)?;
        if cancel.is_cancelled() {
            return Err(CubeError::Cancelled);
        }
        self.sched.acquire_rotation(key.group, key.layer, cancel)?;

        self.hooks.before_rotation(face, layer);
        self.rotate_layer(face, layer);
        self.rotate_outer_faces(face, layer);
        self.hooks.after_rotation(face, layer);

        self.sched.finish_rotation(key.group, key.layer);
        if cancel.is_cancelled() {
            Err(CubeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Captures the full state of the cube.
    ///
    /// Blocks until the scheduler admits the read, then runs
    /// `before_snapshot`, the capture and `after_snapshot` in order,
    /// exactly once each. Any number of snapshots run concurrently, but
    /// never alongside a rotation.
    ///
    /// # Errors
    ///
    /// [`CubeError::Cancelled`], with the same queued/finished semantics as
    /// [`Cube::rotate`].
    pub fn snapshot(&self, cancel: &CancelToken) -> Result<StateView, CubeError> {
        if cancel.is_cancelled() {
            return Err(CubeError::Cancelled);
        }
        self.sched.acquire_snapshot(cancel)?;

        self.hooks.before_snapshot();
        let mut stickers = Vec::with_capacity(6 * self.size * self.size);
        for face in &self.faces {
            face.capture(&mut stickers);
        }
        let view = StateView::new(self.size, stickers);
        self.hooks.after_snapshot();

        self.sched.finish_snapshot();
        if cancel.is_cancelled() {
            Err(CubeError::Cancelled)
        } else {
            Ok(view)
        }
    }

    /// Access to the hooks the cube was built with.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Cycles the four edge strips of the rotated layer.
    fn rotate_layer(&self, face: usize, layer: usize) {
        let size = self.size;
        let mirror = size - layer - 1;
        let [top, left, front, right, back, bottom] = &self.faces;
        match face {
            TOP => {
                let first = left.row(layer);
                left.set_row(layer, &front.row(layer));
                front.set_row(layer, &right.row(layer));
                right.set_row(layer, &back.row(layer));
                back.set_row(layer, &first);
            }
            LEFT => {
                let first = top.column(layer);
                top.set_column(layer, &back.reversed_column(mirror));
                back.set_column(mirror, &bottom.reversed_column(layer));
                bottom.set_column(layer, &front.column(layer));
                front.set_column(layer, &first);
            }
            FRONT => {
                let first = top.row(mirror);
                top.set_row(mirror, &left.reversed_column(mirror));
                left.set_column(mirror, &bottom.row(layer));
                bottom.set_row(layer, &right.reversed_column(layer));
                right.set_column(layer, &first);
            }
            RIGHT => {
                let first = top.reversed_column(mirror);
                top.set_column(mirror, &front.column(mirror));
                front.set_column(mirror, &bottom.column(mirror));
                bottom.set_column(mirror, &back.reversed_column(layer));
                back.set_column(layer, &first);
            }
            BACK => {
                let first = top.reversed_row(layer);
                top.set_row(layer, &right.column(mirror));
                right.set_column(mirror, &bottom.reversed_row(mirror));
                bottom.set_row(mirror, &left.column(layer));
                left.set_column(layer, &first);
            }
            BOTTOM => {
                let first = left.row(mirror);
                left.set_row(mirror, &back.row(mirror));
                back.set_row(mirror, &right.row(mirror));
                right.set_row(mirror, &front.row(mirror));
                front.set_row(mirror, &first);
            }
            _ => unreachable!("face validated by the resolver"),
        }
    }

    /// Rotates the face(s) owned outright by an outer layer. Both branches
    /// apply for a size-1 cube.
    fn rotate_outer_faces(&self, face: usize, layer: usize) {
        if layer == 0 {
            self.faces[face].rotate_clockwise();
        }
        if layer == self.size - 1 {
            self.faces[opposite(face)].rotate_counter_clockwise();
        }
    }
}

impl<H: Hooks> fmt::Debug for Cube<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cube").field("size", &self.size).finish()
    }
}

/// The face opposite the given one.
const fn opposite(face: usize) -> usize {
    match face {
        TOP => BOTTOM,
        LEFT => RIGHT,
        FRONT => BACK,
        RIGHT => LEFT,
        BACK => FRONT,
        _ => TOP,
    }
}
