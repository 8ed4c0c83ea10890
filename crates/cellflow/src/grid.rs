//! Static grid topology: cell contents plus per-cell open-neighbor counts.
//!
//! Cells are stored row-major. The outer ring is always wall, so any
//! non-wall cell has four in-range neighbors and no traversal needs bounds
//! checks.

use crate::cell::Cell;
use crate::direction::{Direction, DIRECTIONS};
use crate::error::InputError;

/// Walled `rows × cols` grid of cells.
#[derive(Clone, Debug)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    /// Non-wall 4-neighbors per cell; fixed once the grid is built.
    open: Vec<u8>,
}

impl Grid {
    /// Builds a grid from text rows and validates the wall border.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, InputError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        if height == 0 || width == 0 {
            return Err(InputError::EmptyGrid);
        }

        let mut cells = Vec::with_capacity(height * width);
        for (row, bytes) in rows.iter().enumerate() {
            let bytes = bytes.as_ref();
            if bytes.len() != width {
                return Err(InputError::RowLength {
                    row,
                    expected: width,
                    found: bytes.len(),
                });
            }
            if !bytes.is_ascii() {
                return Err(InputError::NonAscii { row });
            }
            cells.extend(bytes.iter().copied().map(Cell));
        }

        for row in 0..height {
            for col in 0..width {
                let on_border = row == 0 || col == 0 || row == height - 1 || col == width - 1;
                let cell = cells[row * width + col];
                if on_border && !cell.is_wall() {
                    return Err(InputError::OpenBorder {
                        row,
                        col,
                        found: cell.as_char(),
                    });
                }
            }
        }

        let mut grid = Self {
            rows: height,
            cols: width,
            cells,
            open: vec![0; height * width],
        };
        grid.count_open_neighbors();
        Ok(grid)
    }

    fn count_open_neighbors(&mut self) {
        for idx in 0..self.cells.len() {
            if self.cells[idx].is_wall() {
                continue;
            }
            self.open[idx] = DIRECTIONS
                .iter()
                .filter(|&&d| !self.cells[self.neighbor(idx, d)].is_wall())
                .count() as u8;
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }

    #[inline]
    pub fn position(&self, idx: usize) -> (usize, usize) {
        (idx / self.cols, idx % self.cols)
    }

    /// Index of the neighbor of `idx` in direction `dir`.
    ///
    /// Only valid for non-wall cells (the border guarantees the result is in
    /// range).
    #[inline]
    pub fn neighbor(&self, idx: usize, dir: Direction) -> usize {
        let (dx, dy) = dir.delta();
        let offset = dx * self.cols as isize + dy;
        idx.wrapping_add_signed(offset)
    }

    #[inline]
    pub fn cell(&self, idx: usize) -> Cell {
        self.cells[idx]
    }

    #[inline]
    pub fn is_wall(&self, idx: usize) -> bool {
        self.cells[idx].is_wall()
    }

    /// Count of non-wall 4-neighbors.
    #[inline]
    pub fn open_neighbors(&self, idx: usize) -> u8 {
        self.open[idx]
    }

    /// Exchanges the contents of two cells. Topology is unaffected since
    /// only non-wall cells ever swap.
    #[inline]
    pub fn swap_cells(&mut self, a: usize, b: usize) {
        debug_assert!(!self.cells[a].is_wall() && !self.cells[b].is_wall());
        self.cells.swap(a, b);
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// One row rendered as text.
    pub fn row_string(&self, row: usize) -> String {
        let start = row * self.cols;
        self.cells[start..start + self.cols]
            .iter()
            .map(|c| c.as_char())
            .collect()
    }

    /// Number of cells holding `species`.
    pub fn count(&self, species: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == species).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_neighbor_counts() {
        let grid = Grid::from_rows(&["#####", "#  ##", "# . #", "#####"]).unwrap();
        assert_eq!(grid.open_neighbors(grid.index(1, 1)), 2);
        assert_eq!(grid.open_neighbors(grid.index(1, 2)), 2);
        assert_eq!(grid.open_neighbors(grid.index(2, 2)), 3);
        assert_eq!(grid.open_neighbors(grid.index(2, 3)), 1);
        assert_eq!(grid.open_neighbors(grid.index(0, 0)), 0);
    }

    #[test]
    fn neighbor_indexing() {
        let grid = Grid::from_rows(&["####", "#  #", "#  #", "####"]).unwrap();
        let idx = grid.index(1, 1);
        assert_eq!(grid.position(grid.neighbor(idx, Direction::Down)), (2, 1));
        assert_eq!(grid.position(grid.neighbor(idx, Direction::Right)), (1, 2));
        assert_eq!(grid.position(grid.neighbor(idx, Direction::Up)), (0, 1));
        assert_eq!(grid.position(grid.neighbor(idx, Direction::Left)), (1, 0));
    }

    #[test]
    fn rejects_open_border() {
        let err = Grid::from_rows(&["###", "#  ", "###"]).unwrap_err();
        assert!(matches!(err, InputError::OpenBorder { row: 1, col: 2, .. }));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Grid::from_rows(&["###", "# ##", "###"]).unwrap_err();
        assert!(matches!(err, InputError::RowLength { row: 1, expected: 3, found: 4 }));
    }

    #[test]
    fn rejects_empty() {
        let rows: [&str; 0] = [];
        assert!(matches!(Grid::from_rows(&rows), Err(InputError::EmptyGrid)));
    }

    #[test]
    fn swap_and_render() {
        let mut grid = Grid::from_rows(&["####", "#. #", "####"]).unwrap();
        grid.swap_cells(grid.index(1, 1), grid.index(1, 2));
        assert_eq!(grid.row_string(1), "# .#");
        assert_eq!(grid.count(Cell(b'.')), 1);
    }
}
