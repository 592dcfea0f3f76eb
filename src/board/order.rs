//! Order types for all phases.
//!
//! Represents the full set of orders: hold, move, support, convoy, retreat,
//! disband, build, remove, waive and the state-defining pseudo-order. The
//! data model maps directly to DSON for straightforward parsing and
//! formatting.

use serde::{Deserialize, Serialize};

use super::province::{Coast, ProvinceId};
use super::unit::UnitType;

/// A location on the board: a province with an optional coast specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub province: ProvinceId,
    pub coast: Coast,
}

impl Location {
    /// Creates a location without a coast.
    pub fn new(province: ProvinceId) -> Self {
        Self {
            province,
            coast: Coast::None,
        }
    }

    /// Creates a location with a coast specifier.
    pub fn with_coast(province: ProvinceId, coast: Coast) -> Self {
        Self { province, coast }
    }
}

/// A unit reference in an order.
///
/// The unit type may be left open by the issuer; validation fills it in
/// from the unit actually standing at the location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderUnit {
    pub unit_type: Option<UnitType>,
    pub location: Location,
}

impl OrderUnit {
    pub fn new(unit_type: UnitType, location: Location) -> Self {
        Self {
            unit_type: Some(unit_type),
            location,
        }
    }

    /// A unit reference whose type is not given.
    pub fn untyped(location: Location) -> Self {
        Self {
            unit_type: None,
            location,
        }
    }

    pub fn province(&self) -> ProvinceId {
        self.location.province
    }

    pub fn is(&self, unit_type: UnitType) -> bool {
        self.unit_type == Some(unit_type)
    }
}

/// Discriminant of an `Order`, used by borders and rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderKind {
    Hold,
    Move,
    SupportHold,
    SupportMove,
    Convoy,
    Retreat,
    Disband,
    Build,
    Remove,
    Waive,
    DefineState,
}

/// An order for any of the three phases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Hold: `A vie H`
    Hold { unit: OrderUnit },

    /// Move: `A bud - rum`, `F nrg - stp/nc`, or with a convoy route
    /// `A lon - nwy via nth`.
    Move {
        unit: OrderUnit,
        dest: Location,
        /// The issuer asked for the move to go by convoy.
        by_convoy: bool,
        /// Explicit convoy route (sea provinces in order), empty if none.
        via: Vec<ProvinceId>,
    },

    /// Support hold: `A tyr S A vie H`
    SupportHold { unit: OrderUnit, supported: OrderUnit },

    /// Support move: `A gal S A bud - rum`
    SupportMove {
        unit: OrderUnit,
        supported: OrderUnit,
        dest: Location,
    },

    /// Convoy: `F mao C A bre - spa`
    Convoy {
        unit: OrderUnit,
        convoyed_from: Location,
        convoyed_to: Location,
    },

    /// Retreat: `A vie R boh`
    Retreat { unit: OrderUnit, dest: Location },

    /// Disband a dislodged unit: `F tri D` in a retreat phase.
    Disband { unit: OrderUnit },

    /// Build: `A vie B`
    Build { unit: OrderUnit },

    /// Remove a unit during adjustments: `A war D` in an adjustment phase.
    Remove { unit: OrderUnit },

    /// Waive a build: `W`
    Waive,

    /// Scenario-setup pseudo-order. Never legal during adjudication.
    DefineState { unit: OrderUnit },
}

impl Order {
    pub fn hold(unit: OrderUnit) -> Self {
        Order::Hold { unit }
    }

    /// A plain move with no convoy intent.
    pub fn move_to(unit: OrderUnit, dest: Location) -> Self {
        Order::Move {
            unit,
            dest,
            by_convoy: false,
            via: Vec::new(),
        }
    }

    pub fn kind(&self) -> OrderKind {
        match self {
            Order::Hold { .. } => OrderKind::Hold,
            Order::Move { .. } => OrderKind::Move,
            Order::SupportHold { .. } => OrderKind::SupportHold,
            Order::SupportMove { .. } => OrderKind::SupportMove,
            Order::Convoy { .. } => OrderKind::Convoy,
            Order::Retreat { .. } => OrderKind::Retreat,
            Order::Disband { .. } => OrderKind::Disband,
            Order::Build { .. } => OrderKind::Build,
            Order::Remove { .. } => OrderKind::Remove,
            Order::Waive => OrderKind::Waive,
            Order::DefineState { .. } => OrderKind::DefineState,
        }
    }

    /// The ordered unit, if the order has one.
    pub fn unit(&self) -> Option<&OrderUnit> {
        match self {
            Order::Hold { unit }
            | Order::Move { unit, .. }
            | Order::SupportHold { unit, .. }
            | Order::SupportMove { unit, .. }
            | Order::Convoy { unit, .. }
            | Order::Retreat { unit, .. }
            | Order::Disband { unit }
            | Order::Build { unit }
            | Order::Remove { unit }
            | Order::DefineState { unit } => Some(unit),
            Order::Waive => None,
        }
    }

    pub(crate) fn unit_mut(&mut self) -> Option<&mut OrderUnit> {
        match self {
            Order::Hold { unit }
            | Order::Move { unit, .. }
            | Order::SupportHold { unit, .. }
            | Order::SupportMove { unit, .. }
            | Order::Convoy { unit, .. }
            | Order::Retreat { unit, .. }
            | Order::Disband { unit }
            | Order::Build { unit }
            | Order::Remove { unit }
            | Order::DefineState { unit } => Some(unit),
            Order::Waive => None,
        }
    }

    /// The province the order is issued from.
    pub fn source(&self) -> Option<ProvinceId> {
        self.unit().map(OrderUnit::province)
    }

    /// Destination province of a Move or Retreat.
    pub fn destination(&self) -> Option<ProvinceId> {
        match self {
            Order::Move { dest, .. } | Order::Retreat { dest, .. } => Some(dest.province),
            _ => None,
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, Order::Move { .. })
    }

    pub fn is_support(&self) -> bool {
        matches!(self, Order::SupportHold { .. } | Order::SupportMove { .. })
    }

    pub fn is_convoy(&self) -> bool {
        matches!(self, Order::Convoy { .. })
    }
}
