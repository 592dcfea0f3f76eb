//! Borders between provinces.
//!
//! A border can make a crossing harder (a negative base move modifier, the
//! difficult-passable border) or forbid it outright for some unit types,
//! order kinds or phases. Borders are optionally directional: when `from`
//! is non-empty they only apply to crossings that start in one of those
//! provinces.

use super::order::OrderKind;
use super::province::ProvinceId;
use super::state::PhaseKind;
use super::unit::UnitType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Border {
    pub id: String,
    pub between: (ProvinceId, ProvinceId),
    pub from: Vec<ProvinceId>,
    pub base_move_modifier: i32,
    pub prohibited_units: Vec<UnitType>,
    pub prohibited_orders: Vec<OrderKind>,
    pub prohibited_phases: Vec<PhaseKind>,
}

impl Border {
    /// Whether a crossing starting in `src` is governed by this border.
    pub fn applies_from(&self, src: ProvinceId) -> bool {
        self.from.is_empty() || self.from.contains(&src)
    }

    /// Whether this border forbids the given crossing. Any single matching
    /// prohibition is enough.
    pub fn prohibits(
        &self,
        src: ProvinceId,
        unit_type: UnitType,
        phase: PhaseKind,
        kind: OrderKind,
    ) -> bool {
        self.applies_from(src)
            && (self.prohibited_units.contains(&unit_type)
                || self.prohibited_orders.contains(&kind)
                || self.prohibited_phases.contains(&phase))
    }
}
