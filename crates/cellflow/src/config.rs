//! Simulation parameters that are not part of the grid description.

use crate::cell::Cell;

/// Run-level settings for a [`Simulator`](crate::Simulator).
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Seed of the deterministic random source.
    pub seed: u64,
    /// Ticks executed by [`Simulator::run_configured`](crate::Simulator::run_configured).
    pub ticks: usize,
    /// Species whose unrealised kinetic energy is damped on fold-back.
    pub damped_species: Option<Cell>,
    /// Factor applied to the damped species' fold-back pressure.
    pub damping: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            ticks: 1_000_000,
            damped_species: Some(Cell(b'.')),
            damping: 0.8,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_ticks(mut self, ticks: usize) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn with_damping(mut self, species: Option<Cell>, factor: f64) -> Self {
        self.damped_species = species;
        self.damping = factor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = SimConfig::default().with_seed(7).with_ticks(10).with_damping(None, 1.0);
        assert_eq!(config.seed, 7);
        assert_eq!(config.ticks, 10);
        assert_eq!(config.damped_species, None);
        assert_eq!(SimConfig::default().damped_species, Some(Cell(b'.')));
    }
}
