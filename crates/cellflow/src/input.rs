//! Text description of a simulation: dimensions, gravity, densities, grid.
//!
//! ```text
//! 4 5 0.1 2
//!   0.01
//! . 1000
//! #####
//! #.. #
//! #   #
//! #####
//! ```
//!
//! The header holds `rows cols gravity density_count`. Each density line
//! starts with the species byte (which may itself be a space), then one
//! separator, then the value. Blank lines between sections are ignored.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::cell::Cell;
use crate::density::DensityTable;
use crate::error::InputError;
use crate::grid::Grid;
use crate::number::Number;

/// A decoded and validated simulation description.
#[derive(Clone, Debug)]
pub struct SimInput {
    pub gravity: f64,
    /// `(species byte, density)` pairs in file order.
    pub densities: Vec<(u8, f64)>,
    pub grid: Grid,
}

impl SimInput {
    /// Reads and decodes a description file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let input = text.parse::<Self>()?;
        log::info!(
            "loaded {}: {}x{} grid, {} species, gravity {}",
            path.display(),
            input.grid.rows(),
            input.grid.cols(),
            input.densities.len(),
            input.gravity
        );
        Ok(input)
    }

    /// Builds a description directly from parts (used by tests and tools).
    pub fn from_parts<R: AsRef<[u8]>>(
        rows: &[R],
        gravity: f64,
        densities: &[(u8, f64)],
    ) -> Result<Self, InputError> {
        let input = Self {
            gravity,
            densities: densities.to_vec(),
            grid: Grid::from_rows(rows)?,
        };
        input.check_species()?;
        Ok(input)
    }

    /// Every non-wall cell needs a density, air included.
    fn check_species(&self) -> Result<(), InputError> {
        let table = DensityTable::<f64>::from_entries(self.densities.iter().copied());
        match self
            .grid
            .cells()
            .iter()
            .find(|&&c| !c.is_wall() && !table.contains(c))
        {
            Some(cell) => Err(InputError::UnknownSpecies(cell.as_char())),
            None => Ok(()),
        }
    }

    /// Density table in the requested numeric type.
    pub fn density_table<N: Number>(&self) -> DensityTable<N> {
        DensityTable::from_entries(self.densities.iter().copied())
    }

    /// Species present in the grid (walls excluded), in first-seen order.
    pub fn species(&self) -> Vec<Cell> {
        let mut seen = [false; 256];
        let mut out = Vec::new();
        for &cell in self.grid.cells() {
            if !cell.is_wall() && !seen[cell.byte() as usize] {
                seen[cell.byte() as usize] = true;
                out.push(cell);
            }
        }
        out
    }
}

fn header_field<T: FromStr>(value: Option<&str>, field: &'static str) -> Result<T, InputError> {
    let value = value.ok_or(InputError::MissingHeader)?;
    value.parse().map_err(|_| InputError::InvalidHeader {
        field,
        value: value.to_string(),
    })
}

impl FromStr for SimInput {
    type Err = InputError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l));

        let (_, header) = lines
            .by_ref()
            .find(|(_, l)| !l.trim().is_empty())
            .ok_or(InputError::MissingHeader)?;
        let mut fields = header.split_whitespace();
        let rows: usize = header_field(fields.next(), "row count")?;
        let cols: usize = header_field(fields.next(), "column count")?;
        let gravity: f64 = header_field(fields.next(), "gravity")?;
        let count: usize = header_field(fields.next(), "density count")?;
        if !gravity.is_finite() {
            return Err(InputError::InvalidHeader {
                field: "gravity",
                value: gravity.to_string(),
            });
        }

        // header counts are untrusted until the lines behind them exist
        let mut densities = Vec::new();
        for index in 0..count {
            let (line_no, line) = lines
                .by_ref()
                .find(|(_, l)| !l.is_empty())
                .ok_or(InputError::MissingDensity {
                    index,
                    expected: count,
                })?;
            let species = line.as_bytes()[0];
            let value = line.get(1..).unwrap_or_default().trim();
            let invalid = || InputError::InvalidDensity {
                species: char::from(species),
                line: line_no,
                value: value.to_string(),
            };
            let density: f64 = value.parse().map_err(|_| invalid())?;
            if !density.is_finite() {
                return Err(invalid());
            }
            densities.push((species, density));
        }

        let mut body = lines.skip_while(|(_, l)| l.is_empty());
        let mut grid_rows = Vec::new();
        for index in 0..rows {
            let (_, line) = body.next().ok_or(InputError::MissingRow {
                index,
                expected: rows,
            })?;
            if line.len() != cols {
                return Err(InputError::RowLength {
                    row: index,
                    expected: cols,
                    found: line.len(),
                });
            }
            grid_rows.push(line.as_bytes());
        }

        Self::from_parts(&grid_rows, gravity, &densities)
    }
}
