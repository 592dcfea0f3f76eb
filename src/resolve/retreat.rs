//! Retreat destinations.
//!
//! A dislodged unit may retreat to an adjacent province that is empty, was
//! not the origin of the attack that dislodged it (unless that attack came
//! by convoy), and was not left vacant by a standoff in the movement phase
//! just played. The previous phase's results are scanned once into
//! per-province tables, so each query is a few lookups.

use crate::board::{Location, Order, OrderKind, PhaseKind, Position, ProvinceId, UnitType, WorldMap};

use super::result::OrderResult;
use super::turn::TurnState;

pub struct RetreatChecker<'a> {
    map: &'a WorldMap,
    position: &'a Position,
    standoff: Vec<bool>,
    /// Per dislodged province: where the attack came from and whether it
    /// was convoyed.
    attackers: Vec<Option<(ProvinceId, bool)>>,
}

impl<'a> RetreatChecker<'a> {
    /// Builds the lookup tables from the dislodged units in `position` and
    /// the result log of the movement phase before it.
    pub fn new(map: &'a WorldMap, position: &'a Position, previous: Option<&TurnState>) -> Self {
        let n = map.province_count();
        let mut bounces = vec![0u8; n];
        let mut attackers: Vec<Option<(ProvinceId, bool)>> = vec![None; n];

        for (p, d) in position.dislodged_units() {
            attackers[p.index()] = Some((d.attacker_from, d.by_convoy));
        }

        for r in previous.map(TurnState::results).unwrap_or(&[]) {
            match (&r.order, &r.result) {
                (Some(Order::Move { dest, .. }), OrderResult::Bounced { .. }) => {
                    let b = &mut bounces[dest.province.index()];
                    *b = b.saturating_add(1);
                }
                (Some(order), OrderResult::Dislodged { attacker, by_convoy }) => {
                    if let Some(src) = order.source() {
                        attackers[src.index()] = Some((*attacker, *by_convoy));
                    }
                }
                _ => {}
            }
        }

        RetreatChecker {
            map,
            position,
            standoff: bounces.into_iter().map(|b| b >= 2).collect(),
            attackers,
        }
    }

    /// Whether the province was left empty by a standoff.
    pub fn is_standoff(&self, p: ProvinceId) -> bool {
        self.standoff[p.index()]
    }

    /// Checks one retreat. `dest` must carry the coast for fleets.
    pub fn is_valid(&self, src: Location, unit_type: UnitType, dest: Location) -> bool {
        let d = dest.province;
        let from_attacker = matches!(
            self.attackers[src.province.index()],
            Some((from, false)) if from == d
        );
        self.map.is_adjacent(src, dest, unit_type)
            && self.map.can_occupy(d, unit_type)
            && self.position.unit(d).is_none()
            && !self.standoff[d.index()]
            && !from_attacker
            && self
                .map
                .transit_blocker(src.province, d, unit_type, PhaseKind::Retreat, OrderKind::Retreat)
                .is_none()
    }

    /// Every legal destination for the unit at `src`.
    pub fn destinations(&self, src: Location, unit_type: UnitType) -> Vec<Location> {
        self.map
            .neighbours(src, unit_type)
            .into_iter()
            .filter(|d| self.is_valid(src, unit_type, *d))
            .collect()
    }
}
