//! The four compass directions and their grid deltas.
//!
//! Deltas are `(row, column)` offsets. Iteration order is fixed (up, down,
//! left, right) and every sweep in the simulator depends on it.

/// One of the four axis-aligned neighbor directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// All directions, in sweep order.
pub const DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    /// `(row, column)` offset of the neighbor in this direction.
    #[inline]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Slot of this direction in per-cell arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
