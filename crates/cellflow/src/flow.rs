//! Flow saturation: depth-first augmenting search for cycles of capacity.
//!
//! A push walks from a start cell along edges whose achieved flow is still
//! below capacity, carrying the bottleneck amount. Reaching a cell that is on
//! the current path closes a cycle, and the amount is credited to every edge
//! of the cycle as the search unwinds. The search runs on an explicit stack;
//! visit order and results are those of the natural recursive formulation.

use crate::direction::DIRECTIONS;
use crate::number::Number;
use crate::simulator::Simulator;

/// Result of one flow push.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FlowResult<F> {
    /// Amount pushed (matched) or accumulated from failed branches.
    pub amount: F,
    /// A cycle closed and the caller should credit its edge.
    pub matched: bool,
    /// Cell that closed the cycle.
    pub end: Option<usize>,
}

/// One suspended level of the search.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FlowFrame<F> {
    cell: usize,
    limit: F,
    /// Direction currently being tried.
    next: usize,
    total: F,
}

impl<F: Number> FlowFrame<F> {
    fn new(cell: usize, limit: F) -> Self {
        Self {
            cell,
            limit,
            next: 0,
            total: F::zero(),
        }
    }
}

enum FlowStep<F> {
    Descend { cell: usize, limit: F },
    Finish(FlowResult<F>),
}

impl<P: Number, V: Number, F: Number> Simulator<P, V, F> {
    /// Pushes up to `limit` units of flow around a cycle through `start`.
    pub(crate) fn propagate_flow(&mut self, start: usize, limit: F) -> FlowResult<F> {
        let mut stack = std::mem::take(&mut self.flow_stack);
        stack.clear();
        self.mark_in_progress(start);
        stack.push(FlowFrame::new(start, limit));
        let mut returned: Option<FlowResult<F>> = None;

        let result = loop {
            let Some(mut frame) = stack.pop() else {
                unreachable!("flow stack drained without a result");
            };

            let step = match returned.take() {
                Some(child) if child.matched => {
                    frame.total += child.amount;
                    self.velocity_flow
                        .add(frame.cell, DIRECTIONS[frame.next], child.amount);
                    self.mark_done(frame.cell);
                    FlowStep::Finish(FlowResult {
                        amount: child.amount,
                        matched: child.end != Some(frame.cell),
                        end: child.end,
                    })
                }
                Some(child) => {
                    frame.total += child.amount;
                    frame.next += 1;
                    self.scan_flow(&mut frame)
                }
                None => self.scan_flow(&mut frame),
            };

            match step {
                FlowStep::Descend { cell, limit } => {
                    self.mark_in_progress(cell);
                    stack.push(frame);
                    stack.push(FlowFrame::new(cell, limit));
                }
                FlowStep::Finish(result) => {
                    if stack.is_empty() {
                        break result;
                    }
                    returned = Some(result);
                }
            }
        };

        self.flow_stack = stack;
        result
    }

    /// Tries the frame's remaining directions in order. Either closes a
    /// cycle on an in-progress neighbor, asks to descend into an unvisited
    /// one, or finishes the frame unmatched.
    fn scan_flow(&mut self, frame: &mut FlowFrame<F>) -> FlowStep<F> {
        let cell = frame.cell;
        while frame.next < DIRECTIONS.len() {
            let dir = DIRECTIONS[frame.next];
            let next = self.grid.neighbor(cell, dir);
            if !self.grid.is_wall(next) && !self.is_done(next) {
                let cap: F = self.velocity.get(cell, dir).convert();
                let flow = self.velocity_flow.get(cell, dir);
                if flow != cap {
                    let available = frame.limit.min_of(cap - flow);
                    if self.is_in_progress(next) {
                        self.velocity_flow.add(cell, dir, available);
                        self.mark_done(cell);
                        return FlowStep::Finish(FlowResult {
                            amount: available,
                            matched: true,
                            end: Some(next),
                        });
                    }
                    return FlowStep::Descend {
                        cell: next,
                        limit: available,
                    };
                }
            }
            frame.next += 1;
        }
        self.mark_done(cell);
        FlowStep::Finish(FlowResult {
            amount: frame.total,
            matched: false,
            end: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::direction::Direction::{self, Down, Left, Right, Up};
    use crate::number::Number;
    use crate::simulator::testing::*;

    const RING: [&str; 4] = ["####", "#xx#", "#xx#", "####"];

    fn set_cycle(sim: &mut crate::Simulator<N>, caps: [f64; 4]) {
        // clockwise: (1,1) -> (1,2) -> (2,2) -> (2,1) -> (1,1)
        let edges: [(usize, usize, Direction); 4] =
            [(1, 1, Right), (1, 2, Down), (2, 2, Left), (2, 1, Up)];
        for ((row, col, dir), cap) in edges.into_iter().zip(caps) {
            let idx = at(sim, row, col);
            sim.velocity.set(idx, dir, N::from_f64(cap));
        }
    }

    #[test]
    fn ring_saturates_in_one_push() {
        let mut s = sim(&RING, 0.0);
        set_cycle(&mut s, [0.5; 4]);
        s.next_generation();
        let start = at(&s, 1, 1);
        let push = s.propagate_flow(start, N::one());
        assert!(push.amount == N::from_f64(0.5));
        assert!(!push.matched, "cycle closes on the start cell");
        for (row, col, dir) in [(1, 1, Right), (1, 2, Down), (2, 2, Left), (2, 1, Up)] {
            assert_eq!(s.flow(row, col, dir), N::from_f64(0.5), "edge ({row},{col}) {dir:?}");
        }
    }

    #[test]
    fn bottleneck_limits_the_cycle() {
        let mut s = sim(&RING, 0.0);
        set_cycle(&mut s, [0.5, 0.25, 0.5, 0.5]);
        let sweeps = s.saturate_flow();
        for (row, col, dir) in [(1, 1, Right), (1, 2, Down), (2, 2, Left), (2, 1, Up)] {
            assert_eq!(s.flow(row, col, dir), N::from_f64(0.25), "edge ({row},{col}) {dir:?}");
        }
        // one productive sweep, one that finds nothing
        assert_eq!(sweeps, 2);
    }

    #[test]
    fn dead_end_carries_nothing() {
        let mut s = sim(&["#####", "#xxx#", "#####"], 0.0);
        let a = at(&s, 1, 1);
        let b = at(&s, 1, 2);
        s.velocity.set(a, Right, N::one());
        s.velocity.set(b, Right, N::one());
        let sweeps = s.saturate_flow();
        assert_eq!(sweeps, 1);
        assert_eq!(s.flow(1, 1, Right), N::zero());
        assert_eq!(s.flow(1, 2, Right), N::zero());
    }

    #[test]
    fn flow_never_exceeds_capacity() {
        let mut s = sim(&RING, 0.0);
        set_cycle(&mut s, [0.75, 2.0, 1.5, 0.75]);
        let b = at(&s, 1, 2);
        s.velocity.set(b, Left, N::from_f64(0.5));
        s.saturate_flow();
        for cell in 0..s.grid.len() {
            for dir in crate::DIRECTIONS {
                assert!(s.velocity_flow.get(cell, dir) <= s.velocity.get(cell, dir));
            }
        }
        // the ring is bounded by its 0.75 edges
        assert_eq!(s.flow(1, 1, Right), N::from_f64(0.75));
        assert_eq!(s.flow(1, 2, Down), N::from_f64(0.75));
    }
}
