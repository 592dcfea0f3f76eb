//! Single-turn adjudication.
//!
//! `adjudicate` takes one turn's position and orders and produces the
//! result log and the turn that follows. The steps are:
//!
//! 1. validate every order, logging and replacing the invalid ones;
//! 2. keep the last order per unit and give unordered units a default;
//! 3. link each order to the orders that influence it;
//! 4. verify that supports and convoys match what the supported unit did;
//! 5. evaluate all orders repeatedly until nothing changes;
//! 6. break circular movement and convoy paradoxes if evaluation stalls;
//! 7. settle whatever is left, write the results and build the next
//!    position.
//!
//! Order state lives in an arena sorted by province, so the outcome never
//! depends on the order in which powers submitted their orders.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::{
    DislodgedUnit, Location, Order, OrderUnit, Phase, PhaseKind, Position, PowerId, ProvinceId,
    Unit, WorldMap,
};
use crate::protocol::dson::format_order;
use crate::rules::{RuleOptions, ValidationOptions};

use super::adjustment::{civil_disorder, compute_adjustments};
use super::order_state::{DislodgedState, FailReason, OrderState, Tristate};
use super::path;
use super::phase::{self, Advance, GameOver};
use super::result::{OrderResult, TurnResult};
use super::retreat::RetreatChecker;
use super::turn::TurnState;
use super::validate::{validate_order, ValidationContext};

/// Internal faults. Invalid orders are never errors; they are logged and
/// replaced.
#[derive(Debug, Error)]
pub enum AdjudicationError {
    #[error("turn {0} has already been adjudicated")]
    AlreadyResolved(Phase),

    #[error("order at {province:?} resolved twice ({from:?}, then {to:?})")]
    EvalReassigned {
        province: Option<ProvinceId>,
        from: Tristate,
        to: Tristate,
    },

    #[error("dependencies of the order at {province:?} were linked twice")]
    DependenciesRelinked { province: Option<ProvinceId> },

    #[error("verification stalled with {0} orders unverified")]
    VerifyStalled(usize),

    #[error("two units would end up in province {0}")]
    Collision(ProvinceId),
}

/// What adjudicating a turn produced besides its result log.
#[derive(Debug, Clone)]
pub struct Adjudication {
    /// The turn to play next, `None` once the game is over.
    pub next: Option<TurnState>,
    /// The board after the turn, including ownership changes.
    pub position: Position,
    /// Set when a paradox could not be broken; the moves caught in it
    /// were treated as failed.
    pub unresolved_paradox: bool,
    pub game_over: Option<GameOver>,
}

/// Adjudicates `turn`, appending its results and marking it resolved.
///
/// `previous` is the turn played just before, used in retreat phases to
/// find standoffs and the origin of each dislodging attack.
pub fn adjudicate(
    map: &WorldMap,
    rules: &RuleOptions,
    turn: &mut TurnState,
    previous: Option<&TurnState>,
) -> Result<Adjudication, AdjudicationError> {
    if turn.is_resolved() {
        return Err(AdjudicationError::AlreadyResolved(turn.phase()));
    }
    let current = turn.phase();
    let outcome =
        Adjudicator::new(map, rules, current, turn.position(), previous).run(turn.orders())?;

    for result in outcome.results {
        turn.append_result(result);
    }
    turn.mark_resolved();

    let Advance {
        phase: next_phase,
        position,
        game_over,
    } = phase::advance(map, rules, current, outcome.position);
    if let Some(reason) = game_over {
        info!(?reason, "game over");
        turn.mark_ended();
    }

    Ok(Adjudication {
        next: next_phase.map(|p| TurnState::new(p, position.clone())),
        position,
        unresolved_paradox: outcome.unresolved_paradox,
        game_over,
    })
}

struct Outcome {
    results: Vec<TurnResult>,
    position: Position,
    unresolved_paradox: bool,
}

/// An order that passed validation, with the power that gave it and
/// whether it stands in for an invalid one.
struct Accepted {
    power: PowerId,
    order: Order,
    legal: bool,
}

pub(crate) struct Adjudicator<'a> {
    pub(super) map: &'a WorldMap,
    pub(super) rules: &'a RuleOptions,
    pub(super) phase: Phase,
    pub(super) position: &'a Position,
    previous: Option<&'a TurnState>,
    pub(super) states: Vec<OrderState>,
    /// Arena indices in the sequence evaluation passes visit them.
    sweep: Vec<usize>,
    by_province: Vec<Option<usize>>,
    results: Vec<TurnResult>,
    pub(super) build_quota: Vec<i32>,
    pub(super) removal_quota: Vec<i32>,
    disorder: Vec<(ProvinceId, Unit)>,
    pub(super) unresolved_paradox: bool,
}

impl<'a> Adjudicator<'a> {
    fn new(
        map: &'a WorldMap,
        rules: &'a RuleOptions,
        phase: Phase,
        position: &'a Position,
        previous: Option<&'a TurnState>,
    ) -> Self {
        let mut build_quota = vec![0; map.power_count()];
        let mut removal_quota = vec![0; map.power_count()];
        if phase.kind == PhaseKind::Adjustment {
            for adj in compute_adjustments(map, position, rules) {
                build_quota[adj.power.index()] = adj.amount.max(0);
                removal_quota[adj.power.index()] = (-adj.amount).max(0);
            }
        }
        Adjudicator {
            map,
            rules,
            phase,
            position,
            previous,
            states: Vec::new(),
            sweep: Vec::new(),
            by_province: vec![None; map.province_count()],
            results: Vec::new(),
            build_quota,
            removal_quota,
            disorder: Vec::new(),
            unresolved_paradox: false,
        }
    }

    fn run(self, orders: &BTreeMap<PowerId, Vec<Order>>) -> Result<Outcome, AdjudicationError> {
        self.run_with_sweep(orders, |_| {})
    }

    /// Like `run`, with `arrange` choosing the sequence in which each
    /// evaluation pass visits the orders. The fixed point reached must not
    /// depend on it.
    fn run_with_sweep(
        mut self,
        orders: &BTreeMap<PowerId, Vec<Order>>,
        arrange: impl FnOnce(&mut [usize]),
    ) -> Result<Outcome, AdjudicationError> {
        info!(phase = %self.phase, powers = orders.len(), "adjudicating");
        self.collect_orders(orders);
        arrange(self.sweep.as_mut_slice());
        self.link()?;
        self.verify_all()?;
        self.evaluate_to_fixpoint()?;
        self.resolve_paradoxes()?;
        self.settle()?;
        self.report();
        let position = self.materialize()?;

        let succeeded = self.states.iter().filter(|s| s.eval() == Tristate::Success).count();
        info!(
            phase = %self.phase,
            orders = self.states.len(),
            succeeded,
            unresolved_paradox = self.unresolved_paradox,
            "adjudicated"
        );
        Ok(Outcome {
            results: self.results,
            position,
            unresolved_paradox: self.unresolved_paradox,
        })
    }

    /// Arena index of the order given to the unit in `p`.
    pub(super) fn at(&self, p: ProvinceId) -> Option<usize> {
        self.by_province.get(p.index()).copied().flatten()
    }

    pub(super) fn unresolved_moves(&self) -> usize {
        self.states
            .iter()
            .filter(|s| s.order.is_move() && !s.is_resolved())
            .count()
    }

    // -- Steps 1 and 2 --

    fn collect_orders(&mut self, orders: &BTreeMap<PowerId, Vec<Order>>) {
        let (map, position) = (self.map, self.position);
        let checker = (self.phase.kind == PhaseKind::Retreat)
            .then(|| RetreatChecker::new(map, position, self.previous));
        let amounts: Vec<i32> = self
            .build_quota
            .iter()
            .zip(&self.removal_quota)
            .map(|(b, r)| b - r)
            .collect();
        let ctx = ValidationContext {
            map,
            rules: self.rules,
            phase: self.phase,
            position,
            retreats: checker.as_ref(),
            adjustments: (self.phase.kind == PhaseKind::Adjustment).then_some(amounts.as_slice()),
        };

        let mut accepted: BTreeMap<ProvinceId, Accepted> = BTreeMap::new();
        let mut waives: Vec<Accepted> = Vec::new();
        let mut rejected: BTreeMap<ProvinceId, Order> = BTreeMap::new();
        let mut early: Vec<(PowerId, Option<ProvinceId>, TurnResult)> = Vec::new();

        for (&power, list) in orders {
            for order in list {
                match validate_order(&ctx, power, order, ValidationOptions::STRICT) {
                    Ok(valid) => match valid.source() {
                        Some(src) => {
                            let entry = Accepted {
                                power,
                                order: valid,
                                legal: true,
                            };
                            if let Some(old) = accepted.insert(src, entry) {
                                let text = format_order(map, &old.order);
                                debug!(order = %text, "superseded by a later order");
                                early.push((
                                    old.power,
                                    Some(src),
                                    TurnResult::new(
                                        Some(old.power),
                                        Some(old.order),
                                        OrderResult::Ignored,
                                        format!("{text}: superseded by a later order"),
                                    ),
                                ));
                            }
                        }
                        None => waives.push(Accepted {
                            power,
                            order: valid,
                            legal: true,
                        }),
                    },
                    Err(error) => {
                        let text = format_order(map, order);
                        warn!(power = map.power_name(power), order = %text, %error, "invalid order");
                        if let Some(src) = order.source() {
                            rejected.insert(src, order.clone());
                        }
                        early.push((
                            power,
                            order.source(),
                            TurnResult::new(
                                Some(power),
                                Some(order.clone()),
                                OrderResult::Invalid { error: error.clone() },
                                format!("{text}: {error}"),
                            ),
                        ));
                    }
                }
            }
        }

        early.sort_by_key(|(power, src, _)| (*power, *src));
        self.results.extend(early.into_iter().map(|(_, _, r)| r));

        match self.phase.kind {
            PhaseKind::Movement => {
                for (p, unit) in position.units() {
                    if !accepted.contains_key(&p) {
                        let order = Order::hold(OrderUnit::new(
                            unit.unit_type,
                            Location::with_coast(p, unit.coast),
                        ));
                        self.substitute(&mut accepted, &mut rejected, p, unit.power, order);
                    }
                }
            }
            PhaseKind::Retreat => {
                for (p, dislodged) in position.dislodged_units() {
                    if !accepted.contains_key(&p) {
                        let unit = dislodged.unit;
                        let order = Order::Disband {
                            unit: OrderUnit::new(
                                unit.unit_type,
                                Location::with_coast(p, unit.coast),
                            ),
                        };
                        self.substitute(&mut accepted, &mut rejected, p, unit.power, order);
                    }
                }
            }
            PhaseKind::Adjustment => {}
        }

        for entry in accepted.into_values().chain(waives) {
            self.states
                .push(OrderState::new(entry.order, entry.power, entry.legal));
        }
        for (i, state) in self.states.iter().enumerate() {
            if let Some(src) = state.order.source() {
                self.by_province[src.index()] = Some(i);
            }
        }
        self.sweep = (0..self.states.len()).collect();
        debug!(orders = self.states.len(), "orders collected");
    }

    fn substitute(
        &mut self,
        accepted: &mut BTreeMap<ProvinceId, Accepted>,
        rejected: &mut BTreeMap<ProvinceId, Order>,
        p: ProvinceId,
        power: PowerId,
        order: Order,
    ) {
        let original = rejected.remove(&p);
        let text = format_order(self.map, &order);
        let message = match &original {
            Some(bad) => format!("{text}: replaces {}", format_order(self.map, bad)),
            None => format!("{text}: no order given"),
        };
        if original.is_some() {
            warn!(order = %text, "invalid order replaced");
        }
        let legal = original.is_none();
        self.results.push(TurnResult::new(
            Some(power),
            Some(order.clone()),
            OrderResult::Substituted { original },
            message,
        ));
        accepted.insert(
            p,
            Accepted {
                power,
                order,
                legal,
            },
        );
    }

    // -- Steps 3 and 4 --

    fn link(&mut self) -> Result<(), AdjudicationError> {
        self.classify_moves();
        for i in 0..self.states.len() {
            self.determine_dependencies(i)?;
        }
        Ok(())
    }

    fn verify_all(&mut self) -> Result<(), AdjudicationError> {
        loop {
            let mut progress = false;
            for i in 0..self.states.len() {
                if !self.states[i].is_verified() {
                    progress |= self.verify(i)?;
                }
            }
            let left = self.states.iter().filter(|s| !s.is_verified()).count();
            if left == 0 {
                return Ok(());
            }
            if !progress {
                return Err(AdjudicationError::VerifyStalled(left));
            }
        }
    }

    // -- Step 5 --

    /// Evaluates every order until a full pass changes nothing.
    pub(super) fn evaluate_to_fixpoint(&mut self) -> Result<(), AdjudicationError> {
        let mut passes = 0usize;
        loop {
            passes += 1;
            let mut changed = false;
            for k in 0..self.sweep.len() {
                changed |= self.evaluate(self.sweep[k])?;
            }
            if !changed {
                debug!(
                    passes,
                    unresolved_moves = self.unresolved_moves(),
                    "evaluation settled"
                );
                return Ok(());
            }
        }
    }

    // -- Step 7 --

    /// Resolves everything evaluation left open.
    fn settle(&mut self) -> Result<(), AdjudicationError> {
        // Moves caught in an unbroken paradox fail rather than default to
        // success, so a rules anomaly never moves a unit.
        if self.unresolved_paradox {
            let stuck = self.unresolved_moves();
            self.results.push(TurnResult::info(
                None,
                format!("unresolved paradox: {stuck} move(s) failed"),
            ));
            for state in &mut self.states {
                if state.order.is_move() && !state.is_resolved() {
                    state.set_eval(Tristate::Failure, None)?;
                }
            }
            self.evaluate_to_fixpoint()?;
        }

        let promoted: Vec<usize> = (0..self.states.len())
            .filter(|&i| {
                let state = &self.states[i];
                state.dislodged() == DislodgedState::Maybe
                    && state.eval() != Tristate::Success
                    && state
                        .dislodged_by()
                        .is_some_and(|by| self.states[by.index()].eval() == Tristate::Success)
            })
            .collect();
        for i in promoted {
            if let Some(by) = self.states[i].dislodged_by() {
                self.states[i].set_dislodged(DislodgedState::Yes, by);
            }
        }

        for state in &mut self.states {
            if state.is_resolved() {
                continue;
            }
            if state.dislodged() == DislodgedState::Yes {
                state.set_eval(Tristate::Failure, Some(FailReason::Dislodged))?;
            } else {
                state.set_eval(Tristate::Success, None)?;
            }
        }

        if self.phase.kind == PhaseKind::Adjustment {
            self.settle_adjustments();
        }
        Ok(())
    }

    /// Successful removals, or builds and waives, of `power`.
    fn adjustments_done(&self, power: PowerId, removals: bool) -> i32 {
        self.states
            .iter()
            .filter(|s| {
                s.power() == power
                    && s.eval() == Tristate::Success
                    && match s.order {
                        Order::Remove { .. } => removals,
                        Order::Build { .. } | Order::Waive => !removals,
                        _ => false,
                    }
            })
            .count() as i32
    }

    /// Civil disorder for powers that removed too few units; unused
    /// builds are forfeited.
    fn settle_adjustments(&mut self) {
        for power in self.map.powers() {
            let missing = self.removal_quota[power.index()] - self.adjustments_done(power, true);
            if missing > 0 {
                let spared: Vec<ProvinceId> = self
                    .states
                    .iter()
                    .filter(|s| {
                        s.power() == power
                            && matches!(s.order, Order::Remove { .. })
                            && s.eval() == Tristate::Success
                    })
                    .filter_map(|s| s.order.source())
                    .collect();
                let picked =
                    civil_disorder(self.map, self.position, power, missing as usize, &spared);
                info!(
                    power = self.map.power_name(power),
                    units = picked.len(),
                    "civil disorder"
                );
                self.disorder.extend(picked);
            }
            let unused = self.build_quota[power.index()] - self.adjustments_done(power, false);
            if unused > 0 {
                self.results.push(TurnResult::info(
                    Some(power),
                    format!(
                        "{}: {unused} unused build(s) forfeited",
                        self.map.power_name(power)
                    ),
                ));
            }
        }
    }

    fn report(&mut self) {
        let mut results = Vec::with_capacity(self.states.len());
        for state in &self.states {
            let text = format_order(self.map, &state.order);
            let (result, message) = match (state.eval(), state.reason()) {
                (Tristate::Success, _) => (OrderResult::Succeeded, text.clone()),
                (_, Some(FailReason::Bounced(p))) => (
                    OrderResult::Bounced { against: p },
                    format!("{text}: bounced against {}", self.map.abbr(p)),
                ),
                (_, Some(FailReason::Cut(p))) => (
                    OrderResult::Cut { by: p },
                    format!("{text}: cut by {}", self.map.abbr(p)),
                ),
                (_, reason) => (
                    OrderResult::Failed,
                    format!("{text}: {}", describe_failure(reason)),
                ),
            };
            results.push(TurnResult::new(
                Some(state.power()),
                Some(state.order.clone()),
                result,
                message,
            ));

            if state.order.is_move() && state.is_convoyed() && state.eval() == Tristate::Success {
                if let Some(i) = state.order.source().and_then(|p| self.at(p)) {
                    let route = self.convoy_route(i);
                    let names: Vec<&str> = route.iter().map(|&p| self.map.abbr(p)).collect();
                    results.push(TurnResult::new(
                        Some(state.power()),
                        Some(state.order.clone()),
                        OrderResult::ConvoyPath { route },
                        format!("{text}: convoyed via {}", names.join(" ")),
                    ));
                }
            }

            if let Some((attacker, by_convoy)) = self.dislodger(state) {
                results.push(TurnResult::new(
                    Some(state.power()),
                    Some(state.order.clone()),
                    OrderResult::Dislodged {
                        attacker,
                        by_convoy,
                    },
                    format!("{text}: dislodged from {}", self.map.abbr(attacker)),
                ));
            }
        }

        for (p, unit) in &self.disorder {
            let order = Order::Remove {
                unit: OrderUnit::new(unit.unit_type, Location::with_coast(*p, unit.coast)),
            };
            let message = format!("{}: civil disorder", format_order(self.map, &order));
            results.push(TurnResult::new(
                Some(unit.power),
                Some(order),
                OrderResult::Succeeded,
                message,
            ));
        }
        self.results.extend(results);
    }

    /// Origin of the attack that dislodged `state`'s unit, and whether it
    /// came by convoy.
    fn dislodger(&self, state: &OrderState) -> Option<(ProvinceId, bool)> {
        if state.dislodged() != DislodgedState::Yes {
            return None;
        }
        let attacker = &self.states[state.dislodged_by()?.index()];
        Some((attacker.order.source()?, attacker.is_convoyed()))
    }

    /// Fleets that carried convoyed move `i`.
    fn convoy_route(&self, i: usize) -> Vec<ProvinceId> {
        let Order::Move { unit, dest, via, .. } = &self.states[i].order else {
            return Vec::new();
        };
        if self.uses_named_route(via) {
            return via.clone();
        }
        let carried: Vec<ProvinceId> = self
            .convoy_outcomes(i)
            .into_iter()
            .filter(|(_, eval)| *eval == Tristate::Success)
            .map(|(p, _)| p)
            .collect();
        path::find_chain(self.map, unit.province(), dest.province, &carried).unwrap_or_default()
    }

    /// The board once every successful order has been carried out.
    fn materialize(&self) -> Result<Position, AdjudicationError> {
        match self.phase.kind {
            PhaseKind::Movement => {
                let mut next = self.position.clone_without_units();
                for state in &self.states {
                    let Some(src) = state.order.source() else {
                        continue;
                    };
                    let Some(&unit) = self.position.unit(src) else {
                        continue;
                    };
                    if let (Order::Move { dest, .. }, Tristate::Success) = (&state.order, state.eval()) {
                        place(&mut next, dest.province, Unit { coast: dest.coast, ..unit })?;
                    } else if let Some((attacker_from, by_convoy)) = self.dislodger(state) {
                        next.set_dislodged(
                            src,
                            DislodgedUnit {
                                unit,
                                attacker_from,
                                by_convoy,
                            },
                        );
                    } else {
                        place(&mut next, src, unit)?;
                    }
                }
                Ok(next)
            }
            PhaseKind::Retreat => {
                let mut next = self.position.clone_without_dislodged();
                for state in &self.states {
                    let (Order::Retreat { unit, dest }, Tristate::Success) =
                        (&state.order, state.eval())
                    else {
                        continue;
                    };
                    if let Some(dislodged) = self.position.dislodged(unit.province()) {
                        let moved = Unit {
                            coast: dest.coast,
                            ..dislodged.unit
                        };
                        place(&mut next, dest.province, moved)?;
                    }
                }
                Ok(next)
            }
            PhaseKind::Adjustment => {
                let mut next = self.position.clone_without_dislodged();
                for state in &self.states {
                    if state.eval() != Tristate::Success {
                        continue;
                    }
                    match &state.order {
                        Order::Build { unit } => {
                            if let Some(unit_type) = unit.unit_type {
                                let built =
                                    Unit::with_coast(unit_type, state.power(), unit.location.coast);
                                place(&mut next, unit.province(), built)?;
                            }
                        }
                        Order::Remove { unit } => {
                            next.remove_unit(unit.province());
                        }
                        _ => {}
                    }
                }
                for (p, _) in &self.disorder {
                    next.remove_unit(*p);
                }
                Ok(next)
            }
        }
    }
}

fn place(position: &mut Position, p: ProvinceId, unit: Unit) -> Result<(), AdjudicationError> {
    if position.place_unit(p, unit) {
        Ok(())
    } else {
        Err(AdjudicationError::Collision(p))
    }
}

fn describe_failure(reason: Option<FailReason>) -> &'static str {
    match reason {
        Some(FailReason::Bounced(_)) => "bounced",
        Some(FailReason::Cut(_)) => "support cut",
        Some(FailReason::Dislodged) => "dislodged",
        Some(FailReason::NoConvoyRoute) => "no convoy route",
        Some(FailReason::OwnUnit) => "cannot dislodge own unit",
        Some(FailReason::Unmatched) => "no matching order",
        Some(FailReason::ConvoyParadox) => "convoy paradox",
        Some(FailReason::Standoff) => "standoff",
        Some(FailReason::OverLimit) => "over the adjustment limit",
        None => "failed",
    }
}
