//! Tick-based cellular simulation of incompressible fluid on a walled grid.
//!
//! Each cell holds one species byte (`#` is a wall, everything else is
//! fluid or air). Every tick turns gravity and pressure differences into
//! per-edge velocity, saturates that velocity with cyclic flow, returns the
//! unrealised part as pressure, and finally attempts movement from randomly
//! chosen cells. Contents only rotate when a chain of moves closes back on
//! the cell that started it.
//!
//! Pressure, velocity and flow each use their own [`Number`] type, so the
//! same engine runs on floats or on [`Fixed`] point values.

pub mod cell;
pub mod config;
pub mod density;
pub mod direction;
pub mod error;
pub mod field;
pub mod fixed;
mod flow;
pub mod grid;
pub mod input;
mod movement;
pub mod number;
pub mod simulator;
pub mod snapshot;

pub use cell::Cell;
pub use config::SimConfig;
pub use density::DensityTable;
pub use direction::{Direction, DIRECTIONS};
pub use error::{Error, InputError, Result};
pub use field::DirectionalField;
pub use fixed::{FastFixed, Fixed};
pub use grid::Grid;
pub use input::SimInput;
pub use number::Number;
pub use simulator::{DefaultNumber, RunSummary, Simulator, TickReport};
pub use snapshot::{NullSink, Snapshot, SnapshotSink, TextSink};
