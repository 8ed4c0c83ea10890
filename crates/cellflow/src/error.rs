//! Error types for cellflow.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Problems found while decoding or validating a simulation description.
///
/// All of these are fatal: no simulation is constructed from bad input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("missing header line (expected `rows cols gravity densities`)")]
    MissingHeader,

    #[error("invalid {field} in header: {value:?}")]
    InvalidHeader { field: &'static str, value: String },

    #[error("missing density entry {index} of {expected}")]
    MissingDensity { index: usize, expected: usize },

    #[error("invalid density for species {species:?} on line {line}: {value:?}")]
    InvalidDensity {
        species: char,
        line: usize,
        value: String,
    },

    #[error("species {0:?} has zero density")]
    ZeroDensity(char),

    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    #[error("missing grid row {index} of {expected}")]
    MissingRow { index: usize, expected: usize },

    #[error("grid row {row} has {found} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("non-ASCII byte in grid row {row}")]
    NonAscii { row: usize },

    #[error("border cell ({row}, {col}) is {found:?}, expected a wall")]
    OpenBorder { row: usize, col: usize, found: char },

    #[error("species {0:?} appears in the grid but has no density")]
    UnknownSpecies(char),
}

/// Top-level error for running a simulation.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("failed to emit snapshot: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
