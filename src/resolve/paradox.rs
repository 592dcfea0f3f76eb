//! Breaking stalled resolutions.
//!
//! When evaluation settles with moves still uncertain, the remaining
//! decisions depend on each other in a cycle. Two kinds of cycle are broken
//! here:
//!
//! - circular movement: three or more units moving in a ring, or two units
//!   swapping places where one of them travels by convoy, all move as long
//!   as nothing from outside the ring can beat them into their destinations;
//! - convoy paradoxes: under the Szykman rule a convoyed move whose convoy
//!   is still undecided fails, and has no effect on its destination or on
//!   the supports it attacks. A convoyed move that already bounced but
//!   whose route is still open loses its effect the same way.
//!
//! Szykman is applied in bounded rounds. A paradox still standing after
//! the last round is reported and the leftover moves fail.

use tracing::{debug, warn};

use super::adjudicator::{AdjudicationError, Adjudicator};
use super::order_state::{FailReason, Tristate};

/// Rounds of Szykman resolution before giving up.
pub const SZYKMAN_ROUNDS: usize = 10;

impl Adjudicator<'_> {
    pub(crate) fn resolve_paradoxes(&mut self) -> Result<(), AdjudicationError> {
        if self.unresolved_moves() == 0 {
            return Ok(());
        }
        debug!(
            unresolved = self.unresolved_moves(),
            "evaluation stalled, looking for circular movement"
        );
        if self.break_circular_movement()? {
            self.evaluate_to_fixpoint()?;
        }

        let mut rounds = 0;
        while self.unresolved_moves() > 0 {
            if rounds == SZYKMAN_ROUNDS {
                self.give_up();
                return Ok(());
            }
            rounds += 1;
            let forced = self.apply_szykman()?;
            if !forced && !self.break_circular_movement()? {
                self.give_up();
                return Ok(());
            }
            debug!(round = rounds, "paradox round applied");
            self.evaluate_to_fixpoint()?;
        }
        Ok(())
    }

    fn give_up(&mut self) {
        warn!(
            phase = %self.phase,
            unresolved = self.unresolved_moves(),
            "paradox left unresolved"
        );
        self.unresolved_paradox = true;
    }

    /// Forces every breakable ring of uncertain moves to succeed. Returns
    /// whether any ring was broken.
    fn break_circular_movement(&mut self) -> Result<bool, AdjudicationError> {
        let mut broke = false;
        for ring in self.find_rings() {
            if !self.ring_can_move(&ring) {
                debug!(length = ring.len(), "ring is contested, not breaking");
                continue;
            }
            debug!(length = ring.len(), "breaking circular movement");
            for &i in &ring {
                let state = &mut self.states[i];
                state.mark_circular();
                if !state.is_resolved() {
                    state.set_eval(Tristate::Success, None)?;
                }
            }
            broke = true;
        }
        Ok(broke)
    }

    /// The uncertain move whose unit stands in the destination of
    /// uncertain move `i`.
    fn next_in_ring(&self, i: usize) -> Option<usize> {
        let state = &self.states[i];
        if !state.order.is_move() || state.is_resolved() {
            return None;
        }
        let j = self.at(state.order.destination()?)?;
        let next = &self.states[j];
        (next.order.is_move() && !next.is_resolved()).then_some(j)
    }

    /// Rings of uncertain moves. Plain two-unit swaps are head-to-head
    /// battles, not rings, unless a convoy is involved.
    fn find_rings(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.states.len()];
        let mut rings = Vec::new();
        for start in 0..self.states.len() {
            if seen[start] {
                continue;
            }
            let mut walk: Vec<usize> = Vec::new();
            let mut current = self.next_in_ring(start).map(|_| start);
            while let Some(i) = current {
                if let Some(at) = walk.iter().position(|&w| w == i) {
                    rings.push(walk[at..].to_vec());
                    break;
                }
                if seen[i] {
                    break;
                }
                walk.push(i);
                current = self.next_in_ring(i);
            }
            for w in walk {
                seen[w] = true;
            }
        }
        rings.retain(|ring| {
            ring.len() >= 3 || ring.iter().any(|&i| self.states[i].is_convoyed())
        });
        rings
    }

    /// A ring moves only when every convoyed leg has a sure route and no
    /// move from outside could hold any member back.
    fn ring_can_move(&self, ring: &[usize]) -> bool {
        ring.iter().all(|&i| {
            let state = &self.states[i];
            if state.is_convoyed() && self.route_status(i, None) != Tristate::Success {
                return false;
            }
            state
                .deps()
                .moves_to_destination
                .iter()
                .filter(|c| !ring.contains(&c.index()))
                .all(|c| self.prevent_strength(c.index()).0 < state.self_support_attack_certain())
        })
    }

    /// Fails every uncertain convoyed move that still waits on a convoy.
    /// Convoyed moves already decided but with their route still open
    /// keep their outcome and lose their effect on other orders. Returns
    /// whether anything changed.
    fn apply_szykman(&mut self) -> Result<bool, AdjudicationError> {
        let mut forced = false;
        for i in 0..self.states.len() {
            let state = &self.states[i];
            if !state.order.is_move() || !state.is_convoyed() || state.is_convoy_paradox() {
                continue;
            }
            let open = match state.eval() {
                Tristate::Uncertain => state
                    .deps()
                    .convoys
                    .iter()
                    .any(|c| !self.states[c.index()].is_resolved()),
                Tristate::Failure => self.route_status(i, None) == Tristate::Uncertain,
                Tristate::Success => false,
            };
            if !open {
                continue;
            }
            debug!(province = ?state.order.source(), "convoy paradox, convoyed move has no effect");
            let state = &mut self.states[i];
            forced |= state.mark_convoy_paradox();
            if !state.is_resolved() {
                state.set_eval(Tristate::Failure, Some(FailReason::ConvoyParadox))?;
            }
        }
        Ok(forced)
    }
}
