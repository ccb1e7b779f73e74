//! Snapshot of the cube's full state.

use std::fmt;

/// An owned copy of all six faces, captured atomically with respect to the
/// scheduler's admission window.
///
/// Stickers are stored face-major (top, left, front, right, back, bottom),
/// row-major within a face. `Display` renders the stickers as one digit
/// string in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateView {
    size: usize,
    stickers: Vec<u8>,
}

impl StateView {
    pub(crate) fn new(size: usize, stickers: Vec<u8>) -> Self {
        debug_assert_eq!(stickers.len(), 6 * size * size);
        Self { size, stickers }
    }

    /// The cube's layer count.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The stickers of one face, row-major.
    ///
    /// # Panics
    ///
    /// Panics when `face >= 6`.
    #[must_use]
    pub fn face(&self, face: usize) -> &[u8] {
        assert!(face < 6, "face index out of range: {face}");
        let area = self.size * self.size;
        &self.stickers[face * area..(face + 1) * area]
    }

    /// One sticker's color.
    ///
    /// # Panics
    ///
    /// Panics when `face`, `row` or `col` is out of range.
    #[must_use]
    pub fn sticker(&self, face: usize, row: usize, col: usize) -> u8 {
        assert!(row < self.size && col < self.size, "sticker out of range");
        self.face(face)[row * self.size + col]
    }
}

impl fmt::Display for StateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &color in &self.stickers {
            write!(f, "{color}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn solved_view_renders_face_major_digits() {
        init_test("solved_view_renders_face_major_digits");
        let stickers: Vec<u8> = (0..6).flat_map(|f| std::iter::repeat(f).take(4)).collect();
        let view = StateView::new(2, stickers);
        let rendered = view.to_string();
        crate::assert_with_log!(
            rendered == "000011112222333344445555",
            "rendered digits",
            "000011112222333344445555",
            rendered
        );
        let sticker = view.sticker(3, 1, 1);
        crate::assert_with_log!(sticker == 3, "sticker color", 3u8, sticker);
        crate::test_complete!("solved_view_renders_face_major_digits");
    }
}
