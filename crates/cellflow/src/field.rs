//! Per-cell directional storage (one value per outgoing edge).

use crate::direction::Direction;
use crate::number::Number;

/// One value per `(cell, direction)` pair, cells in row-major order.
///
/// Used for both velocity capacity and achieved flow; the two must agree on
/// cell indexing and direction order.
#[derive(Clone, Debug)]
pub struct DirectionalField<N> {
    values: Vec<[N; 4]>,
}

impl<N: Number> DirectionalField<N> {
    pub fn new(cell_count: usize) -> Self {
        Self {
            values: vec![[N::zero(); 4]; cell_count],
        }
    }

    #[inline]
    pub fn get(&self, cell: usize, dir: Direction) -> N {
        self.values[cell][dir.index()]
    }

    #[inline]
    pub fn set(&mut self, cell: usize, dir: Direction, value: N) {
        self.values[cell][dir.index()] = value;
    }

    /// Adds `delta` to the edge and returns the updated value.
    #[inline]
    pub fn add(&mut self, cell: usize, dir: Direction, delta: N) -> N {
        let slot = &mut self.values[cell][dir.index()];
        *slot += delta;
        *slot
    }

    /// All four edges of a cell.
    #[inline]
    pub fn edges(&self, cell: usize) -> &[N; 4] {
        &self.values[cell]
    }

    /// Exchanges the full edge arrays of two cells.
    #[inline]
    pub fn swap_cells(&mut self, a: usize, b: usize) {
        self.values.swap(a, b);
    }

    /// Zeroes every edge.
    pub fn reset(&mut self) {
        self.values.fill([N::zero(); 4]);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
