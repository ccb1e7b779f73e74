//! Layer identity resolution.
//!
//! A physical layer of the cube can be named from either of two opposite
//! faces. The resolver collapses both forms to one canonical identity: a
//! scheduling [`Group`] (the rotation axis) and a canonical layer index.
//! This is the only place where face/layer validity is checked.
//!
//! Face numbering follows the solved-cube convention: 0 top, 1 left,
//! 2 front, 3 right, 4 back, 5 bottom. Opposite pairs are (0,5), (1,3)
//! and (2,4); each pair is one rotation group.

use crate::error::CubeError;

/// Number of scheduling groups (three rotation axes plus the snapshot class).
pub(crate) const GROUP_COUNT: usize = 4;

/// Index of the snapshot group within per-group tables.
pub(crate) const SNAPSHOT_GROUP: usize = 3;

/// One of the four mutually exclusive scheduling classes.
///
/// Operations from two different groups are never concurrently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Rotations about the top/bottom axis (faces 0 and 5).
    TopBottom,
    /// Rotations about the left/right axis (faces 1 and 3).
    LeftRight,
    /// Rotations about the front/back axis (faces 2 and 4).
    FrontBack,
    /// Full-state snapshot reads.
    Snapshot,
}

impl Group {
    /// Stable index of this group within the scheduler's per-group tables.
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::TopBottom => 0,
            Self::LeftRight => 1,
            Self::FrontBack => 2,
            Self::Snapshot => SNAPSHOT_GROUP,
        }
    }
}

/// Canonical identity of one physical layer: a rotation group plus a
/// face-independent layer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerKey {
    /// The rotation group of the request.
    pub group: Group,
    /// The canonical layer index in `[0, size)`.
    pub layer: usize,
}

/// Resolves a raw `(face, layer)` request to its canonical identity.
///
/// For the second face of each opposite pair (faces 3, 4 and 5) the layer
/// index is mirrored: `size - layer - 1`. The resolver is pure and total
/// over its valid domain.
///
/// # Errors
///
/// Returns [`CubeError::InvalidLayerRequest`] when `face >= 6` or
/// `layer >= size`.
pub fn resolve(face: usize, layer: usize, size: usize) -> Result<LayerKey, CubeError> {
    if face >= 6 || layer >= size {
        return Err(CubeError::InvalidLayerRequest { face, layer, size });
    }
    let group = match face {
        0 | 5 => Group::TopBottom,
        1 | 3 => Group::LeftRight,
        _ => Group::FrontBack,
    };
    let layer = if face < 3 { layer } else { size - layer - 1 };
    Ok(LayerKey { group, layer })
}
