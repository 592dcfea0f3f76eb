//! The per-kind order contract.
//!
//! Every order kind answers three questions for the adjudicator once
//! validation is done:
//!
//! - `determine_dependencies`: which other orders feed into its outcome;
//! - `verify`: whether the unit it supports or convoys gave the matching
//!   order;
//! - `evaluate`: one step of the fixed-point computation, tightening
//!   strengths and resolving the order when its outcome is certain.
//!
//! Each is an exhaustive match over `Order`, so a new kind cannot be added
//! without deciding all three.

use crate::board::{Order, OrderKind, ProvinceId, UnitType};
use crate::rules::ConvoyRoutes;

use super::adjudicator::{AdjudicationError, Adjudicator};
use super::order_state::{
    ConvoyRef, Dependencies, DislodgedState, FailReason, MoveRef, SupportRef, Tristate,
};
use super::path;

/// What an evaluation step concluded about an unresolved order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Pending,
    Success,
    Failure(FailReason),
}

/// Whether a move cuts a support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cut {
    Yes,
    No,
    Unknown,
}

impl Adjudicator<'_> {
    // -- Linking --

    /// Marks convoyed moves and head-to-head pairs. Runs before any
    /// dependencies are determined.
    pub(crate) fn classify_moves(&mut self) {
        for i in 0..self.states.len() {
            let convoyed = match &self.states[i].order {
                Order::Move {
                    unit,
                    dest,
                    by_convoy,
                    via,
                } if unit.is(UnitType::Army) => {
                    *by_convoy
                        || !via.is_empty()
                        || !self.map.is_adjacent(unit.location, *dest, UnitType::Army)
                        || self.has_own_convoy(i, unit.province(), dest.province)
                }
                _ => false,
            };
            self.states[i].set_convoyed(convoyed);
        }

        for i in 0..self.states.len() {
            if !self.states[i].order.is_move() || self.states[i].is_convoyed() {
                continue;
            }
            let (Some(src), Some(dst)) = (
                self.states[i].order.source(),
                self.states[i].order.destination(),
            ) else {
                continue;
            };
            let Some(j) = self.at(dst) else { continue };
            let other = &self.states[j];
            if other.order.is_move()
                && !other.is_convoyed()
                && other.order.destination() == Some(src)
            {
                if let Some(r) = MoveRef::of(&self.states, j) {
                    self.states[i].set_head_to_head(r);
                }
            }
        }
    }

    /// Whether the mover's own power ordered a convoy for this move.
    fn has_own_convoy(&self, i: usize, src: ProvinceId, dst: ProvinceId) -> bool {
        let power = self.states[i].power();
        self.states.iter().any(|s| {
            s.power() == power
                && matches!(&s.order, Order::Convoy { convoyed_from, convoyed_to, .. }
                    if convoyed_from.province == src && convoyed_to.province == dst)
        })
    }

    pub(crate) fn determine_dependencies(&mut self, i: usize) -> Result<(), AdjudicationError> {
        let deps = match &self.states[i].order {
            Order::Move { unit, dest, .. } => {
                self.move_dependencies(i, unit.province(), dest.province)
            }
            Order::Retreat { dest, .. } => {
                let mut deps = Dependencies::default();
                for (j, other) in self.states.iter().enumerate() {
                    if j != i && matches!(&other.order, Order::Retreat { dest: d, .. } if d.province == dest.province)
                    {
                        deps.moves_to_destination.extend(MoveRef::of(&self.states, j));
                    }
                }
                deps
            }
            Order::Hold { unit }
            | Order::SupportHold { unit, .. }
            | Order::SupportMove { unit, .. }
            | Order::Convoy { unit, .. }
            | Order::DefineState { unit } => self.hold_dependencies(i, unit.province()),
            Order::Disband { .. } | Order::Build { .. } | Order::Remove { .. } | Order::Waive => {
                Dependencies::default()
            }
        };
        self.states[i].set_dependencies(deps)
    }

    fn move_dependencies(&self, i: usize, src: ProvinceId, dst: ProvinceId) -> Dependencies {
        let defender = self.position.unit(dst).map(|u| u.power);
        let mut deps = Dependencies::default();
        for (j, other) in self.states.iter().enumerate() {
            if j == i {
                continue;
            }
            match &other.order {
                Order::SupportMove {
                    supported, dest, ..
                } if supported.province() == src && dest.province == dst => {
                    if let Some(r) = SupportRef::of(&self.states, j) {
                        if Some(other.power()) == defender {
                            deps.self_supports.push(r);
                        }
                        deps.supports.push(r);
                    }
                }
                Order::Move { dest, .. } if dest.province == src => {
                    deps.moves_to_source.extend(MoveRef::of(&self.states, j));
                }
                Order::Move { dest, .. } if dest.province == dst => {
                    deps.moves_to_destination.extend(MoveRef::of(&self.states, j));
                }
                Order::Convoy {
                    convoyed_from,
                    convoyed_to,
                    ..
                } if convoyed_from.province == src && convoyed_to.province == dst => {
                    deps.convoys.extend(ConvoyRef::of(&self.states, j));
                }
                _ => {}
            }
        }
        deps
    }

    fn hold_dependencies(&self, i: usize, src: ProvinceId) -> Dependencies {
        let mut deps = Dependencies::default();
        for (j, other) in self.states.iter().enumerate() {
            if j == i {
                continue;
            }
            match &other.order {
                Order::SupportHold { supported, .. } if supported.province() == src => {
                    deps.supports.extend(SupportRef::of(&self.states, j));
                }
                Order::Move { dest, .. } if dest.province == src => {
                    deps.moves_to_source.extend(MoveRef::of(&self.states, j));
                }
                _ => {}
            }
        }
        deps
    }

    // -- Verification --

    /// Checks the supported or convoyed unit gave the matching order.
    /// Unmatched orders fail at once. Returns whether the state changed.
    pub(crate) fn verify(&mut self, i: usize) -> Result<bool, AdjudicationError> {
        let matched = match &self.states[i].order {
            Order::SupportHold { supported, .. } => self
                .at(supported.province())
                .is_some_and(|j| !self.states[j].order.is_move()),
            Order::SupportMove {
                supported, dest, ..
            } => self.at(supported.province()).is_some_and(|j| {
                let target = &self.states[j];
                target.order.is_move() && target.order.destination() == Some(dest.province)
            }),
            Order::Convoy {
                convoyed_from,
                convoyed_to,
                ..
            } => self.at(convoyed_from.province).is_some_and(|j| {
                let target = &self.states[j];
                target.order.is_move()
                    && target.is_convoyed()
                    && target.order.destination() == Some(convoyed_to.province)
            }),
            Order::Hold { .. }
            | Order::Move { .. }
            | Order::Retreat { .. }
            | Order::Disband { .. }
            | Order::Build { .. }
            | Order::Remove { .. }
            | Order::Waive
            | Order::DefineState { .. } => true,
        };
        let state = &mut self.states[i];
        if !matched && !state.is_resolved() {
            state.set_eval(Tristate::Failure, Some(FailReason::Unmatched))?;
        }
        Ok(state.mark_verified())
    }

    // -- Evaluation --

    /// One evaluation step. Returns whether anything changed.
    pub(crate) fn evaluate(&mut self, i: usize) -> Result<bool, AdjudicationError> {
        match self.states[i].order.kind() {
            OrderKind::Move => self.evaluate_move(i),
            OrderKind::SupportHold | OrderKind::SupportMove => self.evaluate_support(i),
            OrderKind::Hold | OrderKind::Convoy | OrderKind::DefineState => self.evaluate_hold(i),
            OrderKind::Retreat => self.evaluate_retreat(i),
            OrderKind::Disband => self.resolve(i, Verdict::Success),
            OrderKind::Build | OrderKind::Remove | OrderKind::Waive => self.evaluate_adjustment(i),
        }
    }

    fn resolve(&mut self, i: usize, verdict: Verdict) -> Result<bool, AdjudicationError> {
        let state = &mut self.states[i];
        if state.is_resolved() {
            return Ok(false);
        }
        match verdict {
            Verdict::Pending => return Ok(false),
            Verdict::Success => state.set_eval(Tristate::Success, None)?,
            Verdict::Failure(reason) => state.set_eval(Tristate::Failure, Some(reason))?,
        }
        Ok(true)
    }

    /// Strength from a list of supports: `(max, certain)`, floored at 0.
    fn support_count(&self, supports: &[SupportRef], modifier: i32) -> (i32, i32) {
        let possible = supports
            .iter()
            .filter(|s| self.states[s.index()].eval() != Tristate::Failure)
            .count() as i32;
        let certain = supports
            .iter()
            .filter(|s| self.states[s.index()].eval() == Tristate::Success)
            .count() as i32;
        ((1 + modifier + possible).max(0), (1 + modifier + certain).max(0))
    }

    fn evaluate_move(&mut self, i: usize) -> Result<bool, AdjudicationError> {
        let (Some(src), Some(dst)) = (
            self.states[i].order.source(),
            self.states[i].order.destination(),
        ) else {
            return Ok(false);
        };
        let modifier = self.map.base_move_modifier(src, dst);
        let (full, attack) = {
            let deps = self.states[i].deps();
            let foreign: Vec<SupportRef> = deps
                .supports
                .iter()
                .filter(|s| !deps.self_supports.contains(s))
                .copied()
                .collect();
            (
                self.support_count(&deps.supports, modifier),
                self.support_count(&foreign, modifier),
            )
        };
        let defense = match self.states[i].eval() {
            Tristate::Uncertain => (1, 0),
            Tristate::Success => (0, 0),
            Tristate::Failure => (1, 1),
        };

        let state = &mut self.states[i];
        let mut changed = state.tighten_self_support_attack(full.0, full.1);
        changed |= state.tighten_attack(attack.0, attack.1);
        changed |= state.tighten_defense(defense.0, defense.1);

        if !self.states[i].is_resolved() {
            let verdict = self.judge_move(i, src, dst);
            changed |= self.resolve(i, verdict)?;
        }

        match self.states[i].eval() {
            Tristate::Success => changed |= self.mark_defender(i, dst),
            Tristate::Failure => {
                let state = &mut self.states[i];
                if state.dislodged() == DislodgedState::Maybe {
                    if let Some(by) = state.dislodged_by() {
                        changed |= state.set_dislodged(DislodgedState::Yes, by);
                    }
                }
            }
            Tristate::Uncertain => {}
        }
        Ok(changed)
    }

    fn judge_move(&self, i: usize, src: ProvinceId, dst: ProvinceId) -> Verdict {
        let me = &self.states[i];
        let mut pending = false;

        if me.is_convoyed() {
            match self.route_status(i, None) {
                Tristate::Failure => return Verdict::Failure(FailReason::NoConvoyRoute),
                Tristate::Uncertain => pending = true,
                Tristate::Success => {}
            }
        }

        // Support from the defender's power only counts once its unit has left.
        let vacated = match self.at(dst) {
            None => Tristate::Success,
            Some(d) if me.head_to_head().map(MoveRef::index) == Some(d) => Tristate::Failure,
            Some(d) if self.states[d].order.is_move() => self.states[d].eval(),
            Some(_) => Tristate::Failure,
        };
        let (attack_max, attack_certain) = match vacated {
            Tristate::Success => (me.self_support_attack_max(), me.self_support_attack_certain()),
            Tristate::Uncertain => (me.self_support_attack_max(), me.attack_certain()),
            Tristate::Failure => (me.attack_max(), me.attack_certain()),
        };

        for c in &me.deps().moves_to_destination {
            let (prevent_max, prevent_certain) = self.prevent_strength(c.index());
            if prevent_certain >= attack_max {
                let from = self.states[c.index()].order.source().unwrap_or(dst);
                return Verdict::Failure(FailReason::Bounced(from));
            }
            if attack_certain <= prevent_max {
                pending = true;
            }
        }

        if let Some(d) = self.at(dst) {
            let defender = &self.states[d];
            let same_power = defender.power() == me.power();
            let head_to_head = me.head_to_head().map(MoveRef::index) == Some(d);
            if head_to_head {
                if same_power {
                    return Verdict::Failure(FailReason::OwnUnit);
                }
                if defender.self_support_attack_certain() >= me.attack_max() {
                    return Verdict::Failure(FailReason::Bounced(dst));
                }
                if me.attack_certain() <= defender.self_support_attack_max() {
                    pending = true;
                }
            } else if defender.order.is_move() {
                match defender.eval() {
                    Tristate::Success => {}
                    Tristate::Failure => {
                        if same_power {
                            return Verdict::Failure(FailReason::OwnUnit);
                        }
                        if me.attack_max() <= 1 {
                            return Verdict::Failure(FailReason::Bounced(dst));
                        }
                        if me.attack_certain() <= 1 {
                            pending = true;
                        }
                    }
                    Tristate::Uncertain => {
                        if same_power || me.attack_certain() <= 1 {
                            pending = true;
                        }
                    }
                }
            } else {
                if same_power {
                    return Verdict::Failure(FailReason::OwnUnit);
                }
                if me.attack_max() <= defender.defense_certain() {
                    return Verdict::Failure(FailReason::Bounced(dst));
                }
                if me.attack_certain() <= defender.defense_max() {
                    pending = true;
                }
            }
        }

        if pending {
            Verdict::Pending
        } else {
            Verdict::Success
        }
    }

    /// Strength with which move `c` keeps other units out of its
    /// destination: `(max, certain)`.
    pub(crate) fn prevent_strength(&self, c: usize) -> (i32, i32) {
        let other = &self.states[c];
        let (max, certain) = (
            other.self_support_attack_max(),
            other.self_support_attack_certain(),
        );
        if other.is_convoy_paradox() {
            return (0, 0);
        }
        if other.is_convoyed() {
            match self.route_status(c, None) {
                Tristate::Failure => return (0, 0),
                Tristate::Uncertain => return (max, 0),
                Tristate::Success => {}
            }
        }
        match other.head_to_head() {
            Some(h) => match self.states[h.index()].eval() {
                Tristate::Success => (0, 0),
                Tristate::Uncertain => (max, 0),
                Tristate::Failure => (max, certain),
            },
            None => (max, certain),
        }
    }

    /// Records the dislodgement caused by successful move `i`.
    fn mark_defender(&mut self, i: usize, dst: ProvinceId) -> bool {
        let Some(d) = self.at(dst) else {
            return false;
        };
        let Some(by) = MoveRef::of(&self.states, i) else {
            return false;
        };
        let defender = &self.states[d];
        let state = match (defender.order.is_move(), defender.eval()) {
            (true, Tristate::Success) => return false,
            (true, Tristate::Uncertain) => DislodgedState::Maybe,
            _ => DislodgedState::Yes,
        };
        self.states[d].set_dislodged(state, by)
    }

    /// Status of the convoy route of move `m`, optionally pretending the
    /// fleet in `exclude` is not there.
    pub(crate) fn route_status(&self, m: usize, exclude: Option<ProvinceId>) -> Tristate {
        let state = &self.states[m];
        let Order::Move { unit, dest, via, .. } = &state.order else {
            return Tristate::Failure;
        };
        let convoys = self.convoy_outcomes(m);
        if self.uses_named_route(via) {
            if exclude.is_some_and(|x| via.contains(&x)) {
                return Tristate::Failure;
            }
            return path::explicit_route_status(via, &convoys);
        }
        path::route_status(self.map, unit.province(), dest.province, &convoys, exclude)
    }

    pub(crate) fn uses_named_route(&self, via: &[ProvinceId]) -> bool {
        !via.is_empty() && self.rules.convoy_routes != ConvoyRoutes::Implicit
    }

    /// Province and current outcome of every convoy ordered for move `m`.
    pub(crate) fn convoy_outcomes(&self, m: usize) -> Vec<(ProvinceId, Tristate)> {
        self.states[m]
            .deps()
            .convoys
            .iter()
            .filter_map(|c| {
                let convoy = &self.states[c.index()];
                convoy.order.source().map(|p| (p, convoy.eval()))
            })
            .collect()
    }

    /// Whether the fleet at `p` was ordered to convoy move `m`.
    fn route_uses(&self, m: usize, p: ProvinceId) -> bool {
        self.states[m]
            .deps()
            .convoys
            .iter()
            .any(|c| self.states[c.index()].order.source() == Some(p))
    }

    fn evaluate_support(&mut self, i: usize) -> Result<bool, AdjudicationError> {
        let defense = self.support_count(&self.states[i].deps().supports, 0);
        let mut changed = self.states[i].tighten_defense(defense.0, defense.1);
        if self.states[i].is_resolved() {
            return Ok(changed);
        }
        let verdict = self.judge_support(i);
        changed |= self.resolve(i, verdict)?;
        Ok(changed)
    }

    fn judge_support(&self, i: usize) -> Verdict {
        let me = &self.states[i];
        if me.dislodged() == DislodgedState::Yes {
            return Verdict::Failure(FailReason::Dislodged);
        }
        let target = match &me.order {
            Order::SupportMove { dest, .. } => Some(dest.province),
            _ => None,
        };

        let mut pending = false;
        for m in &me.deps().moves_to_source {
            let attacker = &self.states[m.index()];
            if attacker.power() == me.power() {
                continue;
            }
            let Some(from) = attacker.order.source() else {
                continue;
            };
            if Some(from) == target {
                // An attack from the province the support is aimed at
                // only matters if it dislodges the supporter.
                match attacker.eval() {
                    Tristate::Success => return Verdict::Failure(FailReason::Dislodged),
                    Tristate::Uncertain => pending = true,
                    Tristate::Failure => {}
                }
                continue;
            }
            match self.cuts(m.index(), target) {
                Cut::Yes => return Verdict::Failure(FailReason::Cut(from)),
                Cut::Unknown => pending = true,
                Cut::No => {}
            }
            // A move that cannot cut the support may still dislodge it.
            match attacker.eval() {
                Tristate::Success => return Verdict::Failure(FailReason::Dislodged),
                Tristate::Uncertain if self.may_dislodge(m.index(), me.defense_certain()) => {
                    pending = true
                }
                _ => {}
            }
        }

        if pending {
            Verdict::Pending
        } else {
            Verdict::Success
        }
    }

    /// Whether move `m` cuts a support aimed at `target`.
    fn cuts(&self, m: usize, target: Option<ProvinceId>) -> Cut {
        let attacker = &self.states[m];
        if attacker.is_convoy_paradox() || attacker.self_support_attack_max() == 0 {
            return Cut::No;
        }
        if attacker.is_convoyed() {
            // A convoy that only gets through via the fleet the support
            // protects cannot cut that support.
            let exclude = target.filter(|&t| self.route_uses(m, t));
            match self.route_status(m, exclude) {
                Tristate::Failure => return Cut::No,
                Tristate::Uncertain => return Cut::Unknown,
                Tristate::Success => {}
            }
        }
        if attacker.self_support_attack_certain() > 0 {
            Cut::Yes
        } else {
            Cut::Unknown
        }
    }

    /// Whether move `m` could still beat a stationary unit defending with
    /// `defense`.
    fn may_dislodge(&self, m: usize, defense: i32) -> bool {
        let attacker = &self.states[m];
        if attacker.is_convoy_paradox() || attacker.attack_max() <= defense {
            return false;
        }
        !attacker.is_convoyed() || self.route_status(m, None) != Tristate::Failure
    }

    /// Hold, Convoy and the state-defining order: they succeed when no
    /// move into their province succeeds.
    fn evaluate_hold(&mut self, i: usize) -> Result<bool, AdjudicationError> {
        let defense = self.support_count(&self.states[i].deps().supports, 0);
        let mut changed = self.states[i].tighten_defense(defense.0, defense.1);
        if self.states[i].is_resolved() {
            return Ok(changed);
        }
        let me = &self.states[i];
        let attacks: Vec<Tristate> = me
            .deps()
            .moves_to_source
            .iter()
            .map(|m| self.states[m.index()].eval())
            .collect();
        let verdict = if me.dislodged() == DislodgedState::Yes
            || attacks.contains(&Tristate::Success)
        {
            Verdict::Failure(FailReason::Dislodged)
        } else if attacks.iter().all(|t| *t == Tristate::Failure) {
            Verdict::Success
        } else {
            Verdict::Pending
        };
        changed |= self.resolve(i, verdict)?;
        Ok(changed)
    }

    fn evaluate_retreat(&mut self, i: usize) -> Result<bool, AdjudicationError> {
        let (Some(src), Some(dst)) = (
            self.states[i].order.source(),
            self.states[i].order.destination(),
        ) else {
            return Ok(false);
        };
        let strength = 1 + self.map.base_move_modifier(src, dst);
        let mut changed = self.states[i].set_retreat_strength(strength);
        if self.states[i].is_resolved() {
            return Ok(changed);
        }

        let me = &self.states[i];
        let mine = me.retreat_strength().unwrap_or(0);
        let mut verdict = Verdict::Success;
        for r in &me.deps().moves_to_destination {
            match self.states[r.index()].retreat_strength() {
                None => verdict = Verdict::Pending,
                Some(theirs) if theirs >= mine => {
                    verdict = Verdict::Failure(FailReason::Standoff);
                    break;
                }
                Some(_) => {}
            }
        }
        changed |= self.resolve(i, verdict)?;
        Ok(changed)
    }

    /// Builds, removals and waives draw on the power's entitlement in
    /// province order, waives last.
    fn evaluate_adjustment(&mut self, i: usize) -> Result<bool, AdjudicationError> {
        if self.states[i].is_resolved() {
            return Ok(false);
        }
        let power = self.states[i].power();
        let removal = matches!(self.states[i].order, Order::Remove { .. });
        let quota = if removal {
            self.removal_quota[power.index()]
        } else {
            self.build_quota[power.index()]
        };
        let ahead = self.states[..i]
            .iter()
            .filter(|s| {
                s.power() == power
                    && match s.order {
                        Order::Remove { .. } => removal,
                        Order::Build { .. } | Order::Waive => !removal,
                        _ => false,
                    }
            })
            .count() as i32;
        let verdict = if ahead < quota {
            Verdict::Success
        } else {
            Verdict::Failure(FailReason::OverLimit)
        };
        self.resolve(i, verdict)
    }
}
