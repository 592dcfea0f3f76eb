//! Convoy routes.
//!
//! A convoy route is a chain of convoyable provinces, each holding a
//! convoying fleet, leading from the army's province to its destination.
//! Three questions are answered here:
//!
//! - is there a *theoretical* route, counting every fleet on the board
//!   whatever it was ordered to do (used by validation);
//! - what is the status of the *actual* route, given the outcomes of the
//!   convoy orders issued for one move so far;
//! - the same status with one province taken out, which tells whether a
//!   convoy depends on a single fleet.

use std::collections::VecDeque;

use crate::board::{Position, ProvinceId, UnitType, WorldMap};

use super::order_state::Tristate;

/// Breadth-first search over `nodes`, from any node adjacent (by sea) to
/// `src` to any node adjacent to `dst`. Returns the shortest chain.
pub fn find_chain(
    map: &WorldMap,
    src: ProvinceId,
    dst: ProvinceId,
    nodes: &[ProvinceId],
) -> Option<Vec<ProvinceId>> {
    search(
        map,
        nodes,
        |n| map.fleet_touches(src, n),
        |n| map.fleet_touches(n, dst),
    )
}

fn search(
    map: &WorldMap,
    nodes: &[ProvinceId],
    is_start: impl Fn(ProvinceId) -> bool,
    is_goal: impl Fn(ProvinceId) -> bool,
) -> Option<Vec<ProvinceId>> {
    let mut prev: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut seen = vec![false; nodes.len()];
    let mut queue = VecDeque::new();

    for (i, &n) in nodes.iter().enumerate() {
        if is_start(n) {
            seen[i] = true;
            queue.push_back(i);
        }
    }

    while let Some(i) = queue.pop_front() {
        if is_goal(nodes[i]) {
            let mut chain = vec![nodes[i]];
            let mut cur = i;
            while let Some(p) = prev[cur] {
                chain.push(nodes[p]);
                cur = p;
            }
            chain.reverse();
            return Some(chain);
        }
        for (j, &m) in nodes.iter().enumerate() {
            if !seen[j] && map.fleet_touches(nodes[i], m) {
                seen[j] = true;
                prev[j] = Some(i);
                queue.push_back(j);
            }
        }
    }
    None
}

/// Provinces whose fleet could take part in a convoy right now.
fn convoy_capable(map: &WorldMap, position: &Position) -> Vec<ProvinceId> {
    position
        .units()
        .filter(|(p, u)| u.unit_type == UnitType::Fleet && map.is_convoyable(*p))
        .map(|(p, _)| p)
        .collect()
}

/// Whether any chain of fleets on the board could carry an army from
/// `src` to `dst`.
pub fn theoretical_route_exists(
    map: &WorldMap,
    position: &Position,
    src: ProvinceId,
    dst: ProvinceId,
) -> bool {
    src != dst && find_chain(map, src, dst, &convoy_capable(map, position)).is_some()
}

/// Whether a theoretical route from `src` to `dst` can pass through the
/// fleet at `via`.
pub fn theoretical_route_through(
    map: &WorldMap,
    position: &Position,
    src: ProvinceId,
    dst: ProvinceId,
    via: ProvinceId,
) -> bool {
    let nodes = convoy_capable(map, position);
    if !nodes.contains(&via) {
        return false;
    }
    let reach = search(map, &nodes, |n| map.fleet_touches(src, n), |n| n == via);
    let onward = search(map, &nodes, |n| n == via, |n| map.fleet_touches(n, dst));
    reach.is_some() && onward.is_some()
}

/// Whether a named route is geometrically sound and every step holds a
/// fleet able to convoy.
pub fn explicit_route_is_possible(
    map: &WorldMap,
    position: &Position,
    src: ProvinceId,
    dst: ProvinceId,
    via: &[ProvinceId],
) -> bool {
    let (Some(&first), Some(&last)) = (via.first(), via.last()) else {
        return false;
    };
    let nodes = convoy_capable(map, position);
    via.iter().all(|p| nodes.contains(p))
        && map.fleet_touches(src, first)
        && map.fleet_touches(last, dst)
        && via.windows(2).all(|w| map.fleet_touches(w[0], w[1]))
}

/// Status of an actual convoy route.
///
/// `convoys` lists the province and current outcome of every convoy order
/// issued for the move. The route succeeds once a chain of successful
/// convoys exists and fails once no chain of not-yet-failed convoys
/// remains. `exclude` removes one province from consideration.
pub fn route_status(
    map: &WorldMap,
    src: ProvinceId,
    dst: ProvinceId,
    convoys: &[(ProvinceId, Tristate)],
    exclude: Option<ProvinceId>,
) -> Tristate {
    let usable = |keep: fn(Tristate) -> bool| -> Vec<ProvinceId> {
        convoys
            .iter()
            .filter(|(p, t)| Some(*p) != exclude && keep(*t))
            .map(|(p, _)| *p)
            .collect()
    };

    let possible = usable(|t| t != Tristate::Failure);
    if find_chain(map, src, dst, &possible).is_none() {
        return Tristate::Failure;
    }
    let certain = usable(|t| t == Tristate::Success);
    if find_chain(map, src, dst, &certain).is_some() {
        return Tristate::Success;
    }
    Tristate::Uncertain
}

/// Status of a named route: every listed province must convoy
/// successfully.
pub fn explicit_route_status(via: &[ProvinceId], convoys: &[(ProvinceId, Tristate)]) -> Tristate {
    let mut status = Tristate::Success;
    for p in via {
        match convoys.iter().find(|(c, _)| c == p).map(|(_, t)| *t) {
            None | Some(Tristate::Failure) => return Tristate::Failure,
            Some(Tristate::Uncertain) => status = Tristate::Uncertain,
            Some(Tristate::Success) => {}
        }
    }
    status
}
