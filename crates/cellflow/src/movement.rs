//! Movement phase traversals.
//!
//! A movement chain starts at one cell and repeatedly picks an outgoing edge
//! at random, weighted by velocity. When the chain reaches the cell that
//! started it the whole cycle rotates by one position. Cells that cannot
//! move are frozen by a stop cascade so later chains in the same sweep do not
//! pick them up.

use crate::direction::DIRECTIONS;
use crate::number::Number;
use crate::simulator::Simulator;

/// Suspended level of a movement chain.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MoveFrame {
    cell: usize,
    first: bool,
    /// Neighbor chosen by the latest draw.
    target: usize,
}

/// Suspended level of a stop cascade.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StopFrame {
    cell: usize,
    next: usize,
}

enum MoveStep {
    Descend(usize),
    Closed,
    Exhausted,
}

/// Index of the first cumulative weight above `draw`. Float rounding can
/// land the draw on the total; that falls back to the last weighted edge.
fn pick_weighted<V: Number>(cumulative: &[V; 4], draw: V) -> usize {
    if let Some(i) = cumulative.iter().position(|&c| c > draw) {
        return i;
    }
    let mut last = 0;
    let mut prev = V::zero();
    for (i, &c) in cumulative.iter().enumerate() {
        if c > prev {
            last = i;
        }
        prev = c;
    }
    last
}

impl<P: Number, V: Number, F: Number> Simulator<P, V, F> {
    /// Sum of non-negative velocities towards open, unfinished neighbors.
    pub(crate) fn move_prob(&self, cell: usize) -> V {
        let mut sum = V::zero();
        for dir in DIRECTIONS {
            let next = self.grid.neighbor(cell, dir);
            if self.grid.is_wall(next) || self.is_done(next) {
                continue;
            }
            let v = self.velocity.get(cell, dir);
            if v >= V::zero() {
                sum += v;
            }
        }
        sum
    }

    /// True when no positive edge leads to an unvisited open neighbor.
    fn is_stuck(&self, cell: usize) -> bool {
        !DIRECTIONS.iter().any(|&dir| {
            let next = self.grid.neighbor(cell, dir);
            !self.grid.is_wall(next)
                && self.is_unvisited(next)
                && self.velocity.get(cell, dir) > V::zero()
        })
    }

    /// Freezes `start` and, transitively, neighbors that can only flow into
    /// frozen cells. Without `force` a cell that still has somewhere to go
    /// is left alone.
    pub(crate) fn propagate_stop(&mut self, start: usize, force: bool) {
        if !force && !self.is_stuck(start) {
            return;
        }
        let mut stack = std::mem::take(&mut self.stop_stack);
        stack.clear();
        self.mark_done(start);
        stack.push(StopFrame { cell: start, next: 0 });

        while let Some(frame) = stack.last_mut() {
            if frame.next == DIRECTIONS.len() {
                stack.pop();
                continue;
            }
            let cell = frame.cell;
            let dir = DIRECTIONS[frame.next];
            frame.next += 1;

            let next = self.grid.neighbor(cell, dir);
            if self.grid.is_wall(next)
                || self.is_done(next)
                || self.velocity.get(cell, dir) > V::zero()
            {
                continue;
            }
            if self.is_stuck(next) {
                self.mark_done(next);
                stack.push(StopFrame { cell: next, next: 0 });
            }
        }

        self.stop_stack = stack;
    }

    /// Runs a movement chain from `start`. Returns true if it closed a cycle.
    pub(crate) fn propagate_move(&mut self, start: usize) -> bool {
        let mut stack = std::mem::take(&mut self.move_stack);
        stack.clear();
        // the initiator stays reachable so the chain can close on it
        self.mark_in_progress(start);
        stack.push(MoveFrame {
            cell: start,
            first: true,
            target: start,
        });
        let mut returned: Option<bool> = None;

        let closed = loop {
            let Some(mut frame) = stack.pop() else {
                unreachable!("move stack drained without a result");
            };

            let closed = if returned.take() == Some(true) {
                true
            } else {
                match self.select_move(&mut frame) {
                    MoveStep::Descend(next) => {
                        self.mark_done(next);
                        stack.push(frame);
                        stack.push(MoveFrame {
                            cell: next,
                            first: false,
                            target: next,
                        });
                        continue;
                    }
                    MoveStep::Closed => true,
                    MoveStep::Exhausted => false,
                }
            };

            self.finish_move(frame, closed);
            if stack.is_empty() {
                break closed;
            }
            returned = Some(closed);
        };

        self.move_stack = stack;
        closed
    }

    /// Draws the next edge for `frame`.
    fn select_move(&mut self, frame: &mut MoveFrame) -> MoveStep {
        let cell = frame.cell;
        let mut cumulative = [V::zero(); 4];
        let mut sum = V::zero();
        for (i, dir) in DIRECTIONS.into_iter().enumerate() {
            let next = self.grid.neighbor(cell, dir);
            if !self.grid.is_wall(next) && !self.is_done(next) {
                let v = self.velocity.get(cell, dir);
                if v >= V::zero() {
                    sum += v;
                }
            }
            cumulative[i] = sum;
        }
        if sum == V::zero() {
            return MoveStep::Exhausted;
        }

        let fraction: V = self.draw::<P>().convert();
        let dir = DIRECTIONS[pick_weighted(&cumulative, fraction * sum)];
        let next = self.grid.neighbor(cell, dir);
        assert!(
            self.velocity.get(cell, dir) > V::zero()
                && !self.grid.is_wall(next)
                && !self.is_done(next),
            "movement picked an unusable edge at {:?} towards {dir:?}",
            self.grid.position(cell)
        );
        frame.target = next;
        if self.is_in_progress(next) {
            MoveStep::Closed
        } else {
            MoveStep::Descend(next)
        }
    }

    /// Seals a chain cell: stamps it, freezes neighbors pushing into it, and
    /// moves its contents one step along a closed chain.
    fn finish_move(&mut self, frame: MoveFrame, closed: bool) {
        let cell = frame.cell;
        self.mark_done(cell);
        for dir in DIRECTIONS {
            let next = self.grid.neighbor(cell, dir);
            if !self.grid.is_wall(next)
                && self.is_unvisited(next)
                && self.velocity.get(cell, dir) < V::zero()
            {
                self.propagate_stop(next, false);
            }
        }
        if closed && !frame.first {
            self.swap_contents(cell, frame.target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pick_weighted;
    use crate::cell::Cell;
    use crate::direction::Direction::{Down, Left, Right, Up};
    use crate::number::Number;
    use crate::simulator::testing::*;

    #[test]
    fn weighted_pick_uses_upper_bound() {
        let c = [0.0, 1.0, 1.0, 3.0];
        assert_eq!(pick_weighted(&c, 0.0), 1);
        assert_eq!(pick_weighted(&c, 0.99), 1);
        assert_eq!(pick_weighted(&c, 1.0), 3);
        assert_eq!(pick_weighted(&c, 3.0), 3);
        assert_eq!(pick_weighted(&[2.0, 2.0, 2.0, 2.0], 2.0), 0);
    }

    #[test]
    fn move_prob_ignores_walls_negatives_and_done_cells() {
        let mut s = sim(&["#####", "#xxx#", "# x #", "#####"], 0.0);
        let c = at(&s, 1, 2);
        s.velocity.set(c, Up, N::from_int(5));
        s.velocity.set(c, Left, N::from_f64(0.5));
        s.velocity.set(c, Right, N::from_f64(-1.0));
        s.velocity.set(c, Down, N::from_f64(0.25));
        s.next_generation();
        assert_eq!(s.move_prob(c), N::from_f64(0.75));

        let below = at(&s, 2, 2);
        s.mark_done(below);
        assert_eq!(s.move_prob(c), N::from_f64(0.5));
    }

    #[test]
    fn closed_ring_rotates_one_step() {
        let mut s = sim(&["####", "#xo#", "#. #", "####"], 0.0);
        let a = at(&s, 1, 1);
        let b = at(&s, 1, 2);
        let c = at(&s, 2, 2);
        let d = at(&s, 2, 1);
        // single outgoing edge per cell: a -> b -> c -> d -> a
        s.velocity.set(a, Right, N::one());
        s.velocity.set(b, Down, N::one());
        s.velocity.set(c, Left, N::one());
        s.velocity.set(d, Up, N::one());
        s.pressure[d] = N::from_int(7);

        s.next_generation();
        assert!(s.propagate_move(a));

        // each parcel moved forward: a <- d, b <- a, c <- b, d <- c
        assert_eq!(s.cell(1, 1), Cell(b'.'));
        assert_eq!(s.cell(1, 2), Cell(b'x'));
        assert_eq!(s.cell(2, 2), Cell(b'o'));
        assert_eq!(s.cell(2, 1), Cell::AIR);
        // state travels with its cell
        assert_eq!(s.pressure(1, 1), N::from_int(7));
        assert_eq!(s.velocity(1, 1, Up), N::one());
        assert_eq!(s.velocity(1, 2, Right), N::one());
        for cell in [a, b, c, d] {
            assert!(s.is_done(cell));
        }
    }

    #[test]
    fn open_chain_moves_nothing() {
        let mut s = sim(&["#####", "#xo #", "#####"], 0.0);
        let a = at(&s, 1, 1);
        let b = at(&s, 1, 2);
        s.velocity.set(a, Right, N::one());
        s.velocity.set(b, Right, N::one());
        s.next_generation();
        assert!(!s.propagate_move(a));
        assert_eq!(s.grid.row_string(1), "#xo #");
        assert!(s.is_done(a) && s.is_done(b) && s.is_done(at(&s, 1, 3)));
    }

    #[test]
    fn stop_cascade_reaches_neighbors_with_no_exit() {
        let mut s = sim(&["#####", "#xxx#", "#####"], 0.0);
        let a = at(&s, 1, 1);
        let b = at(&s, 1, 2);
        let c = at(&s, 1, 3);
        // c pushes right into a wall, so it has no open positive edge
        s.velocity.set(c, Right, N::one());
        s.next_generation();
        s.propagate_stop(a, true);
        assert!(s.is_done(a) && s.is_done(b) && s.is_done(c));
    }

    #[test]
    fn unforced_stop_leaves_mobile_cells() {
        let mut s = sim(&["#####", "#xxx#", "#####"], 0.0);
        let a = at(&s, 1, 1);
        let b = at(&s, 1, 2);
        let c = at(&s, 1, 3);
        s.velocity.set(b, Right, N::one());
        s.next_generation();
        s.propagate_stop(a, true);
        assert!(s.is_done(a));
        // b can still move into c
        assert!(!s.is_done(b));
        assert!(!s.is_done(c));
        s.propagate_stop(b, false);
        assert!(!s.is_done(b));
    }
}
