//! Simulator state and the per-tick phase driver.
//!
//! One tick runs, strictly in order:
//! 1. gravity - downward capacity for every cell with an open cell below
//! 2. pressure exchange - pressure differences become edge capacity
//! 3. flow saturation - repeated augmenting sweeps fill capacity
//! 4. kinetic fold-back - unrealised capacity returns as pressure
//! 5. movement - cells swap contents along the surviving velocity field
//!
//! Traversal bookkeeping uses generation stamps: `last_use[cell]` compared to
//! the current generation `ut` tells whether a cell is unvisited
//! (`< ut - 1`), on the active path (`== ut - 1`) or finished (`== ut`).

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cell::Cell;
use crate::config::SimConfig;
use crate::density::DensityTable;
use crate::direction::{Direction, DIRECTIONS};
use crate::error::{InputError, Result};
use crate::field::DirectionalField;
use crate::fixed::FastFixed;
use crate::flow::FlowFrame;
use crate::grid::Grid;
use crate::input::SimInput;
use crate::movement::{MoveFrame, StopFrame};
use crate::number::Number;
use crate::snapshot::{Snapshot, SnapshotSink};

/// Numeric type used when nothing else is requested.
pub type DefaultNumber = FastFixed<32, 16>;

/// What happened during one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub tick: usize,
    /// At least one movement was attempted. Contents only rotate when a
    /// chain closes back on its initiator.
    pub moved: bool,
    /// Net pressure change from exchange and kinetic fold-back.
    pub pressure_delta: f64,
    /// Saturation sweeps needed before no more flow could be pushed.
    pub flow_sweeps: usize,
}

/// Outcome of [`Simulator::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub snapshots: usize,
}

/// Grid fluid simulator, generic over pressure (`P`), velocity (`V`) and
/// achieved-flow (`F`) number types.
pub struct Simulator<P: Number = DefaultNumber, V: Number = P, F: Number = V> {
    pub(crate) grid: Grid,
    pub(crate) rho: DensityTable<P>,
    gravity: P,
    damped_species: Option<Cell>,
    damping: P,
    pub(crate) pressure: Vec<P>,
    old_pressure: Vec<P>,
    pub(crate) velocity: DirectionalField<V>,
    pub(crate) velocity_flow: DirectionalField<F>,
    pub(crate) last_use: Vec<u64>,
    pub(crate) ut: u64,
    rng: ChaCha8Rng,
    // traversal stacks, kept between ticks to avoid reallocation
    pub(crate) flow_stack: Vec<FlowFrame<F>>,
    pub(crate) move_stack: Vec<MoveFrame>,
    pub(crate) stop_stack: Vec<StopFrame>,
    tick: usize,
}

impl<P: Number, V: Number, F: Number> Simulator<P, V, F> {
    /// Builds a simulator from a validated description.
    ///
    /// Fails if a species present in the grid has a density that is zero in
    /// the pressure type (it is used as a divisor).
    pub fn new(input: &SimInput, config: &SimConfig) -> std::result::Result<Self, InputError> {
        let rho: DensityTable<P> = input.density_table();
        if let Some(cell) = input.species().into_iter().find(|&c| rho.get(c) == P::zero()) {
            return Err(InputError::ZeroDensity(cell.as_char()));
        }

        let grid = input.grid.clone();
        let cells = grid.len();
        log::info!(
            "simulator ready: {}x{} grid, {} open cells, seed {}",
            grid.rows(),
            grid.cols(),
            grid.cells().iter().filter(|c| !c.is_wall()).count(),
            config.seed
        );

        Ok(Self {
            grid,
            rho,
            gravity: P::from_f64(input.gravity),
            damped_species: config.damped_species,
            damping: P::from_f64(config.damping),
            pressure: vec![P::zero(); cells],
            old_pressure: vec![P::zero(); cells],
            velocity: DirectionalField::new(cells),
            velocity_flow: DirectionalField::new(cells),
            last_use: vec![0; cells],
            ut: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            flow_stack: Vec::new(),
            move_stack: Vec::new(),
            stop_stack: Vec::new(),
            tick: 0,
        })
    }

    // ========================================================================
    // Generation stamps
    // ========================================================================

    /// Starts a new traversal generation.
    #[inline]
    pub(crate) fn next_generation(&mut self) {
        self.ut += 2;
    }

    #[inline]
    pub(crate) fn is_done(&self, cell: usize) -> bool {
        self.last_use[cell] == self.ut
    }

    #[inline]
    pub(crate) fn is_in_progress(&self, cell: usize) -> bool {
        self.last_use[cell] == self.ut - 1
    }

    #[inline]
    pub(crate) fn is_unvisited(&self, cell: usize) -> bool {
        self.last_use[cell] < self.ut - 1
    }

    #[inline]
    pub(crate) fn mark_in_progress(&mut self, cell: usize) {
        self.last_use[cell] = self.ut - 1;
    }

    #[inline]
    pub(crate) fn mark_done(&mut self, cell: usize) {
        self.last_use[cell] = self.ut;
    }

    /// Uniform fraction in `[0, 1)` at the resolution of `N`.
    #[inline]
    pub(crate) fn draw<N: Number>(&mut self) -> N {
        N::from_random(self.rng.next_u32())
    }

    // ========================================================================
    // Phases
    // ========================================================================

    fn apply_gravity(&mut self) {
        let g: V = self.gravity.convert();
        for cell in 0..self.grid.len() {
            if self.grid.is_wall(cell) {
                continue;
            }
            if !self.grid.is_wall(self.grid.neighbor(cell, Direction::Down)) {
                self.velocity.add(cell, Direction::Down, g);
            }
        }
    }

    /// Converts last tick's pressure differences into edge capacity.
    /// Returns the total pressure removed.
    fn exchange_pressure(&mut self) -> P {
        self.old_pressure.copy_from_slice(&self.pressure);
        let mut total = P::zero();

        for cell in 0..self.grid.len() {
            if self.grid.is_wall(cell) {
                continue;
            }
            for dir in DIRECTIONS {
                let next = self.grid.neighbor(cell, dir);
                if self.grid.is_wall(next) || self.old_pressure[next] >= self.old_pressure[cell] {
                    continue;
                }
                let mut force = self.old_pressure[cell] - self.old_pressure[next];
                let next_rho = self.rho.get(self.grid.cell(next));

                // momentum already heading back towards us absorbs the force first
                let back = dir.opposite();
                let contr: P = self.velocity.get(next, back).convert();
                if contr * next_rho >= force {
                    let remaining: V = (contr - force / next_rho).convert();
                    self.velocity.set(next, back, remaining);
                    continue;
                }
                force -= contr * next_rho;
                self.velocity.set(next, back, V::zero());

                let own_rho = self.rho.get(self.grid.cell(cell));
                self.velocity.add(cell, dir, (force / own_rho).convert());
                let share = force / P::from_int(self.grid.open_neighbors(cell) as i32);
                self.pressure[cell] -= share;
                total -= share;
            }
        }
        total
    }

    /// Fills achieved flow until a full sweep pushes nothing.
    /// Returns the number of sweeps.
    pub(crate) fn saturate_flow(&mut self) -> usize {
        self.velocity_flow.reset();
        let mut sweeps = 0;
        loop {
            self.next_generation();
            sweeps += 1;
            let mut pushed = false;
            for cell in 0..self.grid.len() {
                if self.grid.is_wall(cell) || self.is_done(cell) {
                    continue;
                }
                let push = self.propagate_flow(cell, F::one());
                if push.amount > F::zero() {
                    pushed = true;
                }
            }
            if !pushed {
                break;
            }
        }
        log::trace!("tick {}: flow saturated after {} sweeps", self.tick, sweeps);
        sweeps
    }

    /// Drops capacity that could not be realised and returns its energy to
    /// the pressure field. Returns the total pressure added.
    fn fold_kinetic_energy(&mut self) -> P {
        let mut total = P::zero();
        for cell in 0..self.grid.len() {
            if self.grid.is_wall(cell) {
                continue;
            }
            let kind = self.grid.cell(cell);
            for dir in DIRECTIONS {
                let old_v = self.velocity.get(cell, dir);
                if old_v <= V::zero() {
                    continue;
                }
                let flow = self.velocity_flow.get(cell, dir);
                assert!(
                    flow <= old_v.convert::<F>(),
                    "achieved flow {flow} exceeds capacity {old_v} at {:?} {dir:?}",
                    self.grid.position(cell)
                );
                // min_of only matters when V and F round differently
                let new_v = flow.convert::<V>().min_of(old_v);
                self.velocity.set(cell, dir, new_v);

                let mut force = (old_v - new_v).convert::<P>() * self.rho.get(kind);
                if self.damped_species == Some(kind) {
                    force *= self.damping;
                }
                let next = self.grid.neighbor(cell, dir);
                let target = if self.grid.is_wall(next) { cell } else { next };
                let share = force / P::from_int(self.grid.open_neighbors(target) as i32);
                self.pressure[target] += share;
                total += share;
            }
        }
        total
    }

    /// Randomised movement sweep. Returns true if any movement was attempted.
    fn apply_movement(&mut self) -> bool {
        self.next_generation();
        let mut moved = false;
        for cell in 0..self.grid.len() {
            if self.grid.is_wall(cell) || self.is_done(cell) {
                continue;
            }
            let roll: V = self.draw();
            if roll < self.move_prob(cell) {
                moved = true;
                self.propagate_move(cell);
            } else {
                self.propagate_stop(cell, true);
            }
        }
        moved
    }

    /// Exchanges everything that travels with a parcel of fluid.
    pub(crate) fn swap_contents(&mut self, a: usize, b: usize) {
        self.grid.swap_cells(a, b);
        self.pressure.swap(a, b);
        self.velocity.swap_cells(a, b);
    }

    // ========================================================================
    // Driver
    // ========================================================================

    /// Advances the simulation by one tick.
    pub fn step(&mut self) -> TickReport {
        self.apply_gravity();
        let mut delta = self.exchange_pressure();
        let flow_sweeps = self.saturate_flow();
        delta += self.fold_kinetic_energy();
        let moved = self.apply_movement();

        let report = TickReport {
            tick: self.tick,
            moved,
            pressure_delta: delta.to_f64(),
            flow_sweeps,
        };
        log::debug!(
            "tick {}: moved={} sweeps={} pressure_delta={}",
            report.tick,
            report.moved,
            report.flow_sweeps,
            report.pressure_delta
        );
        self.tick += 1;
        report
    }

    /// Runs `ticks` ticks, emitting a snapshot after every tick in which a
    /// movement was attempted.
    pub fn run<S: SnapshotSink + ?Sized>(&mut self, ticks: usize, sink: &mut S) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for _ in 0..ticks {
            let report = self.step();
            summary.ticks += 1;
            if report.moved {
                sink.emit(&self.snapshot(report.tick))?;
                summary.snapshots += 1;
            }
        }
        Ok(summary)
    }

    /// Runs the tick count from the configuration this simulator was built with.
    pub fn run_configured<S: SnapshotSink + ?Sized>(
        &mut self,
        config: &SimConfig,
        sink: &mut S,
    ) -> Result<RunSummary> {
        self.run(config.ticks, sink)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn snapshot(&self, tick: usize) -> Snapshot {
        Snapshot::capture(tick, &self.grid)
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.grid.cell(self.grid.index(row, col))
    }

    pub fn open_neighbors(&self, row: usize, col: usize) -> u8 {
        self.grid.open_neighbors(self.grid.index(row, col))
    }

    pub fn pressure(&self, row: usize, col: usize) -> P {
        self.pressure[self.grid.index(row, col)]
    }

    /// Seeds the pressure of a non-wall cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is a wall.
    pub fn set_pressure(&mut self, row: usize, col: usize, value: P) {
        let idx = self.grid.index(row, col);
        assert!(!self.grid.is_wall(idx), "walls carry no pressure");
        self.pressure[idx] = value;
    }

    /// Velocity capacity of the edge leaving `(row, col)` towards `dir`.
    pub fn velocity(&self, row: usize, col: usize, dir: Direction) -> V {
        self.velocity.get(self.grid.index(row, col), dir)
    }

    /// Flow realised on an edge during the last saturation phase.
    pub fn flow(&self, row: usize, col: usize, dir: Direction) -> F {
        self.velocity_flow.get(self.grid.index(row, col), dir)
    }

    pub fn gravity(&self) -> P {
        self.gravity
    }

    pub fn density(&self, cell: Cell) -> P {
        self.rho.get(cell)
    }

    /// Cells currently holding `species`.
    pub fn count(&self, species: Cell) -> usize {
        self.grid.count(species)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn gravity_only_where_below_is_open() {
        let mut s = sim(&["####", "#. #", "#  #", "####"], 0.5);
        s.apply_gravity();
        assert_eq!(s.velocity(1, 1, Direction::Down), N::from_f64(0.5));
        assert_eq!(s.velocity(2, 1, Direction::Down), N::zero());
        assert_eq!(s.velocity(1, 2, Direction::Down), N::from_f64(0.5));
        assert_eq!(s.velocity(1, 1, Direction::Up), N::zero());
    }

    #[test]
    fn pressure_exchange_pushes_towards_lower_pressure() {
        let mut s = sim(&["####", "#xo#", "####"], 0.0);
        s.set_pressure(1, 1, N::from_int(1));
        let removed = s.exchange_pressure();
        // force 1 over density 1 becomes capacity towards the right
        assert_eq!(s.velocity(1, 1, Direction::Right), N::from_int(1));
        // a single open neighbor takes the whole drop
        assert_eq!(s.pressure(1, 1), N::zero());
        assert_eq!(removed, N::from_int(-1));
    }

    #[test]
    fn opposing_momentum_absorbs_force() {
        let mut s = sim(&["####", "#xo#", "####"], 0.0);
        s.set_pressure(1, 1, N::from_f64(0.5));
        // o (density 2) already moving left with capacity 1: covers 0.5 easily
        let o = at(&s, 1, 2);
        s.velocity.set(o, Direction::Left, N::from_int(1));
        let removed = s.exchange_pressure();
        assert_eq!(s.velocity(1, 2, Direction::Left), N::from_f64(0.75));
        assert_eq!(s.velocity(1, 1, Direction::Right), N::zero());
        assert_eq!(removed, N::zero());
        assert_eq!(s.pressure(1, 1), N::from_f64(0.5));
    }

    #[test]
    fn insufficient_opposing_momentum_is_consumed() {
        let mut s = sim(&["####", "#xo#", "####"], 0.0);
        s.set_pressure(1, 1, N::from_int(2));
        let o = at(&s, 1, 2);
        s.velocity.set(o, Direction::Left, N::from_f64(0.5));
        s.exchange_pressure();
        // 0.5 * 2 = 1 of the force absorbed, remaining 1 pushes right
        assert_eq!(s.velocity(1, 2, Direction::Left), N::zero());
        assert_eq!(s.velocity(1, 1, Direction::Right), N::from_int(1));
        assert_eq!(s.pressure(1, 1), N::from_int(1));
    }

    #[test]
    fn fold_back_returns_unrealised_capacity_as_pressure() {
        let mut s = sim(&["####", "#xo#", "####"], 0.0);
        let x = at(&s, 1, 1);
        s.velocity.set(x, Direction::Right, N::from_f64(0.5));
        s.velocity_flow.reset();
        let added = s.fold_kinetic_energy();
        assert_eq!(s.velocity(1, 1, Direction::Right), N::zero());
        // 0.5 capacity * density 1 lands on the open neighbor
        assert_eq!(s.pressure(1, 2), N::from_f64(0.5));
        assert_eq!(added, N::from_f64(0.5));
    }

    #[test]
    fn fold_back_into_wall_stays_on_source_and_damps_species() {
        let mut s = sim(&["###", "#.#", "# #", "###"], 0.0);
        let dot = at(&s, 1, 1);
        s.velocity.set(dot, Direction::Up, N::from_f64(0.001));
        s.velocity_flow.reset();
        s.fold_kinetic_energy();
        // 0.001 * 1000 * 0.8 on the cell itself (one open neighbor)
        let p = s.pressure(1, 1).to_f64();
        assert!((p - 0.8).abs() < 0.01, "pressure {p}");
        assert_eq!(s.pressure(2, 1), N::zero());
    }

    /// Runs one tick phase by phase, checking achieved flow against
    /// capacity between saturation and fold-back.
    fn step_checking_flow(s: &mut Simulator<N>) {
        s.apply_gravity();
        s.exchange_pressure();
        s.saturate_flow();
        for cell in 0..s.grid.len() {
            for dir in DIRECTIONS {
                let flow = s.velocity_flow.get(cell, dir);
                let capacity: N = s.velocity.get(cell, dir).convert();
                assert!(
                    flow <= capacity,
                    "tick {}: flow {flow} over capacity {capacity} at {:?} {dir:?}",
                    s.tick,
                    s.grid.position(cell)
                );
            }
        }
        s.fold_kinetic_energy();
        s.apply_movement();
        s.tick += 1;
    }

    #[test]
    fn saturated_flow_within_capacity_on_tank() {
        let rows = [
            "##########",
            "#  ....  #",
            "#  .oo.  #",
            "#x      x#",
            "#  #  #  #",
            "#   oo   #",
            "##########",
        ];
        let mut s = sim(&rows, 0.3);
        for _ in 0..120 {
            step_checking_flow(&mut s);
        }
    }

    fn walled_grid() -> impl Strategy<Value = Vec<String>> {
        (2usize..=6, 2usize..=8).prop_flat_map(|(rows, cols)| {
            let interior = prop::sample::select(vec![' ', ' ', '.', '.', 'o', 'x', '#']);
            prop::collection::vec(interior, rows * cols).prop_map(move |chars| {
                let mut out = vec!["#".repeat(cols + 2)];
                for row in chars.chunks(cols) {
                    out.push(format!("#{}#", row.iter().collect::<String>()));
                }
                out.push("#".repeat(cols + 2));
                out
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn saturated_flow_within_capacity(
            rows in walled_grid(),
            gravity in 0.0f64..0.6,
            seed in any::<u64>(),
        ) {
            let input = SimInput::from_parts(&rows, gravity, &DENSITIES).unwrap();
            let mut s: Simulator<N> =
                Simulator::new(&input, &SimConfig::default().with_seed(seed)).unwrap();
            for _ in 0..30 {
                step_checking_flow(&mut s);
            }
        }
    }

    #[test]
    fn dead_end_move_counts_as_attempted() {
        let mut s = sim(&["####", "#xo#", "####"], 0.0);
        let x = at(&s, 1, 1);
        s.velocity.set(x, Direction::Right, N::one());
        // o has nowhere to go, so the chain cannot close on x
        assert!(s.apply_movement());
        assert_eq!(s.cell(1, 1), Cell(b'x'));
        assert_eq!(s.cell(1, 2), Cell(b'o'));
    }

    #[test]
    fn accessors_report_topology() {
        let s = sim(&["#####", "# . #", "#####"], 0.1);
        assert_eq!(s.open_neighbors(1, 2), 2);
        assert_eq!(s.open_neighbors(1, 1), 1);
        assert_eq!(s.cell(1, 2), Cell(b'.'));
        assert_eq!(s.count(Cell(b'.')), 1);
        assert_eq!(s.gravity(), N::from_f64(0.1));
        assert_eq!(s.density(Cell(b'o')), N::from_int(2));
        assert_eq!(s.tick(), 0);
    }

    #[test]
    #[should_panic(expected = "walls carry no pressure")]
    fn walls_reject_pressure() {
        let mut s = sim(&["###", "# #", "###"], 0.1);
        s.set_pressure(0, 0, N::one());
    }

    #[test]
    fn zero_density_rejected() {
        let input = SimInput::from_parts(&["###", "# #", "###"], 0.1, &[(b' ', 0.0)]).unwrap();
        let err = Simulator::<N>::new(&input, &SimConfig::default()).err();
        assert!(matches!(err, Some(InputError::ZeroDensity(' '))));
    }
}
