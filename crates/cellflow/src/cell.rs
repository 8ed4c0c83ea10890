//! Cell contents - one ASCII byte per grid position.

/// What occupies a grid position.
///
/// `#` is a wall and a space is empty air; every other byte names a fluid
/// species whose density comes from the density table. Air is simulated like
/// any light fluid, only walls are excluded from every phase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cell(pub u8);

impl Cell {
    pub const WALL: Cell = Cell(b'#');
    pub const AIR: Cell = Cell(b' ');

    #[inline]
    pub const fn is_wall(self) -> bool {
        self.0 == Self::WALL.0
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        self.0 == Self::AIR.0
    }

    /// True for species other than air.
    #[inline]
    pub const fn is_fluid(self) -> bool {
        !self.is_wall() && !self.is_air()
    }

    #[inline]
    pub const fn byte(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn as_char(self) -> char {
        char::from(self.0)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::AIR
    }
}

impl From<u8> for Cell {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}
