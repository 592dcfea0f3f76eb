//! Turn state.
//!
//! A `TurnState` bundles one phase's position, the orders each power
//! submitted for it and the result log. Adjudication marks it resolved
//! and hands back the next turn; after that only results may be appended.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::board::{Order, Phase, Position, PowerId};

use super::adjudicator::AdjudicationError;
use super::result::TurnResult;

#[derive(Debug, Clone, Serialize)]
pub struct TurnState {
    phase: Phase,
    position: Position,
    orders: BTreeMap<PowerId, Vec<Order>>,
    results: Vec<TurnResult>,
    resolved: bool,
    ended: bool,
}

impl TurnState {
    pub fn new(phase: Phase, position: Position) -> Self {
        TurnState {
            phase,
            position,
            orders: BTreeMap::new(),
            results: Vec::new(),
            resolved: false,
            ended: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Queues an order. Orders are kept in submission order per power.
    pub fn add_order(&mut self, power: PowerId, order: Order) -> Result<(), AdjudicationError> {
        if self.resolved {
            return Err(AdjudicationError::AlreadyResolved(self.phase));
        }
        self.orders.entry(power).or_default().push(order);
        Ok(())
    }

    pub fn orders(&self) -> &BTreeMap<PowerId, Vec<Order>> {
        &self.orders
    }

    pub fn orders_for(&self, power: PowerId) -> &[Order] {
        self.orders.get(&power).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The result log, in the order entries were appended.
    pub fn results(&self) -> &[TurnResult] {
        &self.results
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Whether the game ended with this turn.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub(crate) fn append_result(&mut self, result: TurnResult) {
        self.results.push(result);
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    pub(crate) fn mark_ended(&mut self) {
        self.ended = true;
    }
}
