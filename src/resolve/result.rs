//! Result log entries.
//!
//! Every adjudication appends `TurnResult`s to the turn's log. Entries
//! carry structured fields (bouncer, dislodger, route) for callers that
//! render them, plus a readable message.

use serde::Serialize;

use crate::board::{Order, PowerId, ProvinceId};

use super::validate::OrderError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderResult {
    Succeeded,
    Failed,
    /// A move stopped by a stronger or equal unit from `against`.
    Bounced { against: ProvinceId },
    /// A support cut by an attack from `by`.
    Cut { by: ProvinceId },
    Dislodged { attacker: ProvinceId, by_convoy: bool },
    /// The entry's order was put in place of `original` (None when the
    /// unit had no order at all).
    Substituted { original: Option<Order> },
    Invalid { error: OrderError },
    /// Route taken by a successful convoyed move.
    ConvoyPath { route: Vec<ProvinceId> },
    /// A duplicate order for an already-ordered unit was discarded.
    Ignored,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnResult {
    pub power: Option<PowerId>,
    pub order: Option<Order>,
    pub result: OrderResult,
    pub message: String,
}

impl TurnResult {
    pub fn new(
        power: Option<PowerId>,
        order: Option<Order>,
        result: OrderResult,
        message: impl Into<String>,
    ) -> Self {
        TurnResult {
            power,
            order,
            result,
            message: message.into(),
        }
    }

    /// A general message not tied to an order.
    pub fn info(power: Option<PowerId>, message: impl Into<String>) -> Self {
        Self::new(power, None, OrderResult::Info, message)
    }

    pub fn is_success(&self) -> bool {
        self.result == OrderResult::Succeeded
    }
}
