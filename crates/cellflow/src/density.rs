//! Density lookup indexed by raw cell byte.

use crate::cell::Cell;
use crate::number::Number;

/// 256-entry density table. Bytes without an entry read as zero.
#[derive(Clone, Debug)]
pub struct DensityTable<N> {
    values: [N; 256],
    known: [bool; 256],
}

impl<N: Number> DensityTable<N> {
    pub fn new() -> Self {
        Self {
            values: [N::zero(); 256],
            known: [false; 256],
        }
    }

    /// Builds a table from `(species, density)` pairs; later entries win.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u8, f64)>,
    {
        let mut table = Self::new();
        for (species, density) in entries {
            table.set(Cell(species), N::from_f64(density));
        }
        table
    }

    #[inline]
    pub fn set(&mut self, cell: Cell, density: N) {
        self.values[cell.byte() as usize] = density;
        self.known[cell.byte() as usize] = true;
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> N {
        self.values[cell.byte() as usize]
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.known[cell.byte() as usize]
    }
}

impl<N: Number> Default for DensityTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
