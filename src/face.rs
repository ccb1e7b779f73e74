//! Sticker storage for one cube face.
//!
//! Cells are atomic bytes because two concurrently admitted rotations of
//! distinct canonical layers in the same group may touch the same face
//! arrays. The layers they cycle are disjoint cell sets, so relaxed
//! per-cell atomicity is enough; cross-batch visibility is ordered by the
//! scheduler lock.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug)]
pub(crate) struct Face {
    size: usize,
    cells: Vec<AtomicU8>,
}

impl Face {
    pub(crate) fn new(size: usize, color: u8) -> Self {
        Self {
            size,
            cells: (0..size * size).map(|_| AtomicU8::new(color)).collect(),
        }
    }

    fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.size + col].load(Ordering::Relaxed)
    }

    fn set(&self, row: usize, col: usize, color: u8) {
        self.cells[row * self.size + col].store(color, Ordering::Relaxed);
    }

    pub(crate) fn row(&self, row: usize) -> Vec<u8> {
        (0..self.size).map(|col| self.get(row, col)).collect()
    }

    pub(crate) fn column(&self, col: usize) -> Vec<u8> {
        (0..self.size).map(|row| self.get(row, col)).collect()
    }

    pub(crate) fn reversed_row(&self, row: usize) -> Vec<u8> {
        let mut strip = self.row(row);
        strip.reverse();
        strip
    }

    pub(crate) fn reversed_column(&self, col: usize) -> Vec<u8> {
        let mut strip = self.column(col);
        strip.reverse();
        strip
    }

    pub(crate) fn set_row(&self, row: usize, strip: &[u8]) {
        for (col, &color) in strip.iter().enumerate() {
            self.set(row, col, color);
        }
    }

    pub(crate) fn set_column(&self, col: usize, strip: &[u8]) {
        for (row, &color) in strip.iter().enumerate() {
            self.set(row, col, color);
        }
    }

    /// Rotates the whole face a quarter turn clockwise, in place.
    ///
    /// Only ever called for a layer that owns this face exclusively.
    pub(crate) fn rotate_clockwise(&self) {
        let old: Vec<u8> = self.cells.iter().map(|c| c.load(Ordering::Relaxed)).collect();
        for row in 0..self.size {
            for col in 0..self.size {
                self.set(col, self.size - row - 1, old[row * self.size + col]);
            }
        }
    }

    /// Rotates the whole face a quarter turn counter-clockwise, in place.
    pub(crate) fn rotate_counter_clockwise(&self) {
        let old: Vec<u8> = self.cells.iter().map(|c| c.load(Ordering::Relaxed)).collect();
        for row in 0..self.size {
            for col in 0..self.size {
                self.set(self.size - col - 1, row, old[row * self.size + col]);
            }
        }
    }

    /// Appends the face's stickers, row-major, to `out`.
    pub(crate) fn capture(&self, out: &mut Vec<u8>) {
        for cell in &self.cells {
            out.push(cell.load(Ordering::Relaxed));
        }
    }
}
