//! Grid snapshots emitted after ticks in which a movement was attempted.

use std::fmt;
use std::io::{self, Write};

use crate::grid::Grid;

/// The grid's cell characters at the end of one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub tick: usize,
    pub rows: Vec<String>,
}

impl Snapshot {
    pub fn capture(tick: usize, grid: &Grid) -> Self {
        Self {
            tick,
            rows: (0..grid.rows()).map(|r| grid.row_string(r)).collect(),
        }
    }

    /// Occurrences of `species` across all rows.
    pub fn count(&self, species: char) -> usize {
        self.rows
            .iter()
            .map(|r| r.chars().filter(|&c| c == species).count())
            .sum()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tick {}:", self.tick)?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Receiver of snapshots.
pub trait SnapshotSink {
    fn emit(&mut self, snapshot: &Snapshot) -> io::Result<()>;
}

/// Keeps every snapshot in memory.
impl SnapshotSink for Vec<Snapshot> {
    fn emit(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.push(snapshot.clone());
        Ok(())
    }
}

/// Writes snapshots as plain text, one grid row per line.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SnapshotSink for TextSink<W> {
    fn emit(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        write!(self.out, "{snapshot}")
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn emit(&mut self, _snapshot: &Snapshot) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_format() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]).unwrap();
        let mut sink = TextSink::new(Vec::new());
        sink.emit(&Snapshot::capture(12, &grid)).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "Tick 12:\n###\n#.#\n###\n");
    }

    #[test]
    fn collecting_sink_and_counts() {
        let grid = Grid::from_rows(&["####", "#..#", "####"]).unwrap();
        let mut frames: Vec<Snapshot> = Vec::new();
        frames.emit(&Snapshot::capture(0, &grid)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].count('.'), 2);
        assert_eq!(frames[0].count('#'), 10);
    }
}
