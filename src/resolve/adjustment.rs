//! Adjustment counts and civil disorder.
//!
//! At the end of a game year each power may build or must remove units so
//! that its unit count matches its supply-center count. Builds are capped
//! by the number of free centers the build rule lets the power use. When a
//! power does not remove enough units, the ones farthest from home go.

use crate::board::{PowerId, Position, ProvinceId, Unit, WorldMap};
use crate::rules::{BuildRule, RuleOptions};

/// Build or removal entitlement of one power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub power: PowerId,
    pub supply_centers: usize,
    pub units: usize,
    /// Positive: builds allowed. Negative: removals required.
    pub amount: i32,
}

/// Computes the adjustment for one power.
pub fn adjustment_for(
    map: &WorldMap,
    position: &Position,
    rules: &RuleOptions,
    power: PowerId,
) -> Adjustment {
    let supply_centers = position.center_count(power);
    let units = position.unit_count(power);
    let base = supply_centers as i32 - units as i32;

    let amount = if base <= 0 {
        base
    } else {
        let owned = |p: &ProvinceId| position.sc_owner(*p) == Some(power);
        let free = |p: &ProvinceId| position.unit(*p).is_none();

        let homes: Vec<ProvinceId> = map.home_centers(power).filter(owned).collect();
        match rules.builds {
            BuildRule::HomeOnly => base.min(homes.iter().filter(|p| free(*p)).count() as i32),
            BuildRule::AnyIfHomeOwned if homes.is_empty() => 0,
            BuildRule::AnyOwned | BuildRule::AnyIfHomeOwned => {
                let open = map.supply_centers().filter(owned).filter(free).count();
                base.min(open as i32)
            }
        }
    };

    Adjustment {
        power,
        supply_centers,
        units,
        amount,
    }
}

/// Adjustments for every power, in power order.
pub fn compute_adjustments(
    map: &WorldMap,
    position: &Position,
    rules: &RuleOptions,
) -> Vec<Adjustment> {
    map.powers()
        .map(|power| adjustment_for(map, position, rules, power))
        .collect()
}

/// Picks `count` units of `power` to remove, skipping `spared`.
///
/// Units farthest from the nearest home center go first; ties go to
/// fleets before armies before wings, then by province name.
pub fn civil_disorder(
    map: &WorldMap,
    position: &Position,
    power: PowerId,
    count: usize,
    spared: &[ProvinceId],
) -> Vec<(ProvinceId, Unit)> {
    let homes: Vec<ProvinceId> = map.home_centers(power).collect();

    let mut candidates: Vec<(u32, ProvinceId, Unit)> = position
        .units()
        .filter(|(p, u)| u.power == power && !spared.contains(p))
        .map(|(p, u)| {
            let distance = map.min_distance(p, &homes).unwrap_or(u32::MAX);
            (distance, p, *u)
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.2.unit_type.disband_rank().cmp(&b.2.unit_type.disband_rank()))
            .then_with(|| map.full_name(a.1).cmp(map.full_name(b.1)))
    });

    candidates
        .into_iter()
        .take(count)
        .map(|(_, p, u)| (p, u))
        .collect()
}
