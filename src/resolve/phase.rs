//! Phase sequencing.
//!
//! Determines the phase that follows a resolved one, updates supply-center
//! ownership at the end of the Fall season and checks victory conditions.
//!
//! Phase flow:
//! - Spring Movement -> Spring Retreat (if dislodged) or Fall Movement
//! - Spring Retreat -> Fall Movement
//! - Fall Movement -> Fall Retreat (if dislodged) or Fall Adjustment
//! - Fall Retreat -> Fall Adjustment
//! - Fall Adjustment -> Spring Movement of the next year
//!
//! An Adjustment phase in which no power may build or must remove is
//! skipped.

use serde::Serialize;

use crate::board::{Phase, PhaseKind, Position, PowerId, Season, UnitType, WorldMap};
use crate::rules::RuleOptions;

use super::adjustment::compute_adjustments;

/// Why the game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameOver {
    /// A power reached the variant's victory center count.
    Solo(PowerId),
    /// The variant's last year has been played.
    YearLimit(u16),
}

/// The phase after `phase`, before any skipping.
pub fn next_phase(phase: Phase, has_dislodgements: bool) -> Phase {
    let Phase { year, season, kind } = phase;
    match (season, kind) {
        (_, PhaseKind::Movement) if has_dislodgements => Phase::new(year, season, PhaseKind::Retreat),
        (Season::Spring, PhaseKind::Movement | PhaseKind::Retreat) => {
            Phase::new(year, Season::Fall, PhaseKind::Movement)
        }
        (Season::Fall, PhaseKind::Movement | PhaseKind::Retreat) => {
            Phase::new(year, Season::Fall, PhaseKind::Adjustment)
        }
        (_, PhaseKind::Adjustment) => Phase::new(year + 1, Season::Spring, PhaseKind::Movement),
    }
}

/// Supply centers are captured by the power whose army or fleet occupies
/// them. Wings never capture. Empty centers keep their owner.
pub fn update_sc_ownership(map: &WorldMap, position: &mut Position) {
    let captures: Vec<_> = position
        .units()
        .filter(|(p, u)| map.is_supply_center(*p) && u.unit_type != UnitType::Wing)
        .map(|(p, u)| (p, u.power))
        .collect();
    for (p, power) in captures {
        position.set_sc_owner(p, Some(power));
    }
}

/// Flags every power left with no units and no supply centers.
pub fn update_eliminations(map: &WorldMap, position: &mut Position) {
    for power in map.powers() {
        let gone = position.unit_count(power) == 0 && position.center_count(power) == 0;
        position.set_eliminated(power, gone);
    }
}

/// Returns the power holding the victory center count, if any.
pub fn solo_winner(map: &WorldMap, position: &Position) -> Option<PowerId> {
    map.powers()
        .find(|&power| position.center_count(power) >= map.victory_centers())
}

/// Outcome of moving a resolved phase forward.
#[derive(Debug, Clone)]
pub struct Advance {
    /// The next phase to play, `None` when the game ended.
    pub phase: Option<Phase>,
    pub position: Position,
    pub game_over: Option<GameOver>,
}

/// Moves from a resolved `phase` to the next playable one.
///
/// `position` is the already-materialized board after `phase`.
pub fn advance(
    map: &WorldMap,
    rules: &RuleOptions,
    phase: Phase,
    mut position: Position,
) -> Advance {
    let mut next = next_phase(phase, position.has_dislodged());

    let end_of_fall = phase.season == Season::Fall
        && phase.kind != PhaseKind::Adjustment
        && next.kind == PhaseKind::Adjustment;
    if end_of_fall {
        update_sc_ownership(map, &mut position);
        update_eliminations(map, &mut position);
        if let Some(winner) = solo_winner(map, &position) {
            return Advance {
                phase: None,
                position,
                game_over: Some(GameOver::Solo(winner)),
            };
        }
        let nothing_to_adjust = compute_adjustments(map, &position, rules)
            .iter()
            .all(|a| a.amount == 0);
        if nothing_to_adjust {
            next = next_phase(next, false);
        }
    }

    if phase.kind == PhaseKind::Adjustment {
        update_eliminations(map, &mut position);
    }

    if next.season == Season::Spring && next.kind == PhaseKind::Movement {
        if let Some(last) = map.max_year() {
            if next.year > last {
                return Advance {
                    phase: None,
                    position,
                    game_over: Some(GameOver::YearLimit(last)),
                };
            }
        }
    }

    if next.kind != PhaseKind::Retreat {
        position = position.clone_without_dislodged();
    }

    Advance {
        phase: Some(next),
        position,
        game_over: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{DislodgedUnit, Unit};

    fn map() -> &'static WorldMap {
        WorldMap::standard()
    }

    fn phase(season: Season, kind: PhaseKind) -> Phase {
        Phase::new(1901, season, kind)
    }

    #[test]
    fn sequencing() {
        use PhaseKind::*;
        use Season::*;
        assert_eq!(next_phase(phase(Spring, Movement), false), phase(Fall, Movement));
        assert_eq!(next_phase(phase(Spring, Movement), true), phase(Spring, Retreat));
        assert_eq!(next_phase(phase(Spring, Retreat), false), phase(Fall, Movement));
        assert_eq!(next_phase(phase(Fall, Movement), false), phase(Fall, Adjustment));
        assert_eq!(next_phase(phase(Fall, Movement), true), phase(Fall, Retreat));
        assert_eq!(next_phase(phase(Fall, Retreat), false), phase(Fall, Adjustment));
        assert_eq!(
            next_phase(phase(Fall, Adjustment), false),
            Phase::new(1902, Spring, Movement)
        );
    }

    #[test]
    fn armies_capture_wings_do_not() {
        let m = map();
        let (bel, hol) = (m.province("bel").unwrap(), m.province("hol").unwrap());
        let mut pos = Position::with_home_centers(m);
        pos.place_unit(bel, Unit::new(UnitType::Army, PowerId(2)));
        pos.place_unit(hol, Unit::new(UnitType::Wing, PowerId(3)));
        update_sc_ownership(m, &mut pos);
        assert_eq!(pos.sc_owner(bel), Some(PowerId(2)));
        assert_eq!(pos.sc_owner(hol), None);
    }

    #[test]
    fn fall_without_changes_skips_adjustment() {
        let m = map();
        let mut pos = Position::with_home_centers(m);
        for p in m.supply_centers() {
            if let Some(owner) = m.home_power(p) {
                pos.place_unit(p, Unit::new(UnitType::Army, owner));
            }
        }
        let adv = advance(m, &RuleOptions::default(), phase(Season::Fall, PhaseKind::Movement), pos);
        assert_eq!(adv.phase, Some(Phase::new(1902, Season::Spring, PhaseKind::Movement)));
        assert_eq!(adv.game_over, None);
    }

    #[test]
    fn fall_capture_leads_to_adjustment() {
        let m = map();
        let mut pos = Position::with_home_centers(m);
        pos.place_unit(m.province("bel").unwrap(), Unit::new(UnitType::Army, PowerId(2)));
        let adv = advance(m, &RuleOptions::default(), phase(Season::Fall, PhaseKind::Movement), pos);
        assert_eq!(adv.phase, Some(phase(Season::Fall, PhaseKind::Adjustment)));
        assert_eq!(adv.position.sc_owner(m.province("bel").unwrap()), Some(PowerId(2)));
    }

    #[test]
    fn dislodgement_leads_to_retreat_without_capture() {
        let m = map();
        let bel = m.province("bel").unwrap();
        let mut pos = Position::with_home_centers(m);
        pos.place_unit(bel, Unit::new(UnitType::Army, PowerId(2)));
        pos.set_dislodged(
            m.province("hol").unwrap(),
            DislodgedUnit {
                unit: Unit::new(UnitType::Army, PowerId(3)),
                attacker_from: bel,
                by_convoy: false,
            },
        );
        let adv = advance(m, &RuleOptions::default(), phase(Season::Fall, PhaseKind::Movement), pos);
        assert_eq!(adv.phase, Some(phase(Season::Fall, PhaseKind::Retreat)));
        assert_eq!(adv.position.sc_owner(bel), None);
        assert!(adv.position.has_dislodged());
    }

    #[test]
    fn solo_ends_the_game() {
        let m = map();
        let france = m.power("France").unwrap();
        let mut pos = Position::empty(m);
        for p in m.supply_centers().take(18) {
            pos.set_sc_owner(p, Some(france));
        }
        let adv = advance(m, &RuleOptions::default(), phase(Season::Fall, PhaseKind::Retreat), pos);
        assert_eq!(adv.phase, None);
        assert_eq!(adv.game_over, Some(GameOver::Solo(france)));
    }

    #[test]
    fn powers_without_units_or_centers_are_eliminated() {
        let m = map();
        let mut pos = Position::with_home_centers(m);
        let italy = m.power("Italy").unwrap();
        for p in m.home_centers(italy).collect::<Vec<_>>() {
            pos.set_sc_owner(p, None);
        }
        update_eliminations(m, &mut pos);
        assert!(pos.is_eliminated(italy));
        assert!(!pos.is_eliminated(m.power("France").unwrap()));
    }
}
