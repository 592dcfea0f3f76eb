//! Order validation.
//!
//! Checks a single order against the position before adjudication: phase
//! applicability, ownership, unit type, coasts, adjacency or convoy
//! routes, borders and the kind-specific rules. A valid order comes back
//! normalized (unit types filled in, coasts resolved); an invalid one
//! yields an `OrderError` and is replaced by the caller.

use serde::Serialize;
use thiserror::Error;

use crate::board::{
    Coast, Location, Order, OrderKind, OrderUnit, Phase, PhaseKind, Position, PowerId,
    ProvinceId, UnitType, WorldMap,
};
use crate::rules::{BuildRule, ConvoyRoutes, RuleOptions, Strictness, ValidationOptions};

use super::path;
use super::retreat::RetreatChecker;

/// Why an order was rejected. Provinces are named by abbreviation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum OrderError {
    #[error("{kind:?} orders are not allowed in a {phase:?} phase")]
    WrongPhase { kind: OrderKind, phase: PhaseKind },

    #[error("state definitions cannot be adjudicated")]
    StateDefinition,

    #[error("no unit in {province}")]
    NoUnit { province: String },

    #[error("the unit in {province} belongs to {owner}")]
    NotOwner { province: String, owner: String },

    #[error("ordered a {ordered:?} in {province} but it holds a {actual:?}")]
    UnitTypeMismatch {
        province: String,
        ordered: UnitType,
        actual: UnitType,
    },

    #[error("a unit type is required")]
    UnitTypeRequired,

    #[error("wings are not enabled")]
    WingsDisabled,

    #[error("a unit cannot move to its own province")]
    SameProvince,

    #[error("a {unit:?} cannot be in {province}")]
    CannotOccupy { province: String, unit: UnitType },

    #[error("{to} is not adjacent to {from}")]
    NotAdjacent { from: String, to: String },

    #[error("no convoy route from {from} to {to}")]
    NoConvoyRoute { from: String, to: String },

    #[error("convoyed moves must name their route")]
    RouteRequired,

    #[error("the named convoy route cannot be followed")]
    InvalidRoute,

    #[error("{province} needs a coast")]
    CoastRequired { province: String },

    #[error("{province} has no coast '{coast}'")]
    InvalidCoast { province: String, coast: String },

    #[error("border '{border}' forbids this order")]
    BorderProhibits { border: String },

    #[error("a unit cannot support itself")]
    SupportSelf,

    #[error("the supporting unit cannot reach {province}")]
    SupportUnreachable { province: String },

    #[error("the supported unit cannot reach {province}")]
    SupportedUnreachable { province: String },

    #[error("only fleets can convoy")]
    ConvoyNotFleet,

    #[error("fleets cannot convoy from {province}")]
    ConvoyNotAtSea { province: String },

    #[error("only armies can be convoyed")]
    ConvoyedNotArmy,

    #[error("no convoy route from {from} to {to} passes through {via}")]
    NoRouteThrough { from: String, to: String, via: String },

    #[error("no dislodged unit in {province}")]
    NotDislodged { province: String },

    #[error("cannot retreat to {province}")]
    InvalidRetreat { province: String },

    #[error("{province} is not a supply center")]
    NotSupplyCenter { province: String },

    #[error("{province} is not a home supply center")]
    NotHomeCenter { province: String },

    #[error("no home supply center is owned")]
    NoHomeCenterOwned,

    #[error("{province} is not owned by the builder")]
    CenterNotOwned { province: String },

    #[error("{province} is occupied")]
    CenterOccupied { province: String },

    #[error("no builds are available")]
    NoBuildsAvailable,

    #[error("no removals are required")]
    NoRemovalsRequired,
}

/// Everything validation may look at.
pub struct ValidationContext<'a> {
    pub map: &'a WorldMap,
    pub rules: &'a RuleOptions,
    pub phase: Phase,
    pub position: &'a Position,
    /// Retreat destinations, present in retreat phases.
    pub retreats: Option<&'a RetreatChecker<'a>>,
    /// Adjustment per power, present in adjustment phases.
    pub adjustments: Option<&'a [i32]>,
}

/// Validates `order` issued by `power`, returning the normalized order.
pub fn validate_order(
    ctx: &ValidationContext<'_>,
    power: PowerId,
    order: &Order,
    opts: ValidationOptions,
) -> Result<Order, OrderError> {
    check_phase(order.kind(), ctx.phase.kind)?;
    let v = Validator { ctx, power, opts };
    let mut order = order.clone();
    match &mut order {
        Order::Hold { unit } => {
            v.own_unit(unit)?;
        }
        Order::Move {
            unit,
            dest,
            by_convoy,
            via,
        } => v.validate_move(unit, dest, by_convoy, via)?,
        Order::SupportHold { unit, supported } => v.validate_support_hold(unit, supported)?,
        Order::SupportMove {
            unit,
            supported,
            dest,
        } => v.validate_support_move(unit, supported, dest)?,
        Order::Convoy {
            unit,
            convoyed_from,
            convoyed_to,
        } => v.validate_convoy(unit, convoyed_from, convoyed_to)?,
        Order::Retreat { unit, dest } => v.validate_retreat(unit, dest)?,
        Order::Disband { unit } => {
            v.dislodged_unit(unit)?;
        }
        Order::Build { unit } => v.validate_build(unit)?,
        Order::Remove { unit } => {
            v.own_unit(unit)?;
            if v.adjustment() >= 0 {
                return Err(OrderError::NoRemovalsRequired);
            }
        }
        Order::Waive => {
            if v.adjustment() <= 0 {
                return Err(OrderError::NoBuildsAvailable);
            }
        }
        Order::DefineState { .. } => return Err(OrderError::StateDefinition),
    }
    Ok(order)
}

fn check_phase(kind: OrderKind, phase: PhaseKind) -> Result<(), OrderError> {
    let allowed = match kind {
        OrderKind::Hold
        | OrderKind::Move
        | OrderKind::SupportHold
        | OrderKind::SupportMove
        | OrderKind::Convoy => phase == PhaseKind::Movement,
        OrderKind::Retreat | OrderKind::Disband => phase == PhaseKind::Retreat,
        OrderKind::Build | OrderKind::Remove | OrderKind::Waive => phase == PhaseKind::Adjustment,
        OrderKind::DefineState => return Err(OrderError::StateDefinition),
    };
    if allowed {
        Ok(())
    } else {
        Err(OrderError::WrongPhase { kind, phase })
    }
}

struct Validator<'c, 'a> {
    ctx: &'c ValidationContext<'a>,
    power: PowerId,
    opts: ValidationOptions,
}

impl Validator<'_, '_> {
    fn name(&self, p: ProvinceId) -> String {
        self.ctx.map.abbr(p).to_string()
    }

    fn adjustment(&self) -> i32 {
        self.ctx
            .adjustments
            .and_then(|a| a.get(self.power.index()).copied())
            .unwrap_or(0)
    }

    /// Reconciles the ordered unit type with the actual one.
    fn fill_type(&self, unit: &mut OrderUnit, actual: UnitType) -> Result<(), OrderError> {
        match unit.unit_type {
            Some(t) if t != actual && self.opts.strictness == Strictness::Strict => {
                Err(OrderError::UnitTypeMismatch {
                    province: self.name(unit.province()),
                    ordered: t,
                    actual,
                })
            }
            _ => {
                unit.unit_type = Some(actual);
                Ok(())
            }
        }
    }

    fn check_wing(&self, unit_type: UnitType) -> Result<(), OrderError> {
        if unit_type == UnitType::Wing && !self.ctx.rules.wings {
            return Err(OrderError::WingsDisabled);
        }
        Ok(())
    }

    /// Checks the ordered unit exists and belongs to the issuer; fills in
    /// its type and coast. Returns the unit type.
    fn own_unit(&self, unit: &mut OrderUnit) -> Result<UnitType, OrderError> {
        let p = unit.province();
        let actual = self
            .ctx
            .position
            .unit(p)
            .copied()
            .ok_or_else(|| OrderError::NoUnit {
                province: self.name(p),
            })?;
        if actual.power != self.power {
            return Err(OrderError::NotOwner {
                province: self.name(p),
                owner: self.ctx.map.power_name(actual.power).to_string(),
            });
        }
        self.fill_type(unit, actual.unit_type)?;
        self.check_wing(actual.unit_type)?;
        unit.location.coast = actual.coast;
        Ok(actual.unit_type)
    }

    /// Like `own_unit`, for a unit dislodged in the previous phase.
    fn dislodged_unit(&self, unit: &mut OrderUnit) -> Result<UnitType, OrderError> {
        let p = unit.province();
        let actual = self
            .ctx
            .position
            .dislodged(p)
            .map(|d| d.unit)
            .ok_or_else(|| OrderError::NotDislodged {
                province: self.name(p),
            })?;
        if actual.power != self.power {
            return Err(OrderError::NotOwner {
                province: self.name(p),
                owner: self.ctx.map.power_name(actual.power).to_string(),
            });
        }
        self.fill_type(unit, actual.unit_type)?;
        unit.location.coast = actual.coast;
        Ok(actual.unit_type)
    }

    /// Checks a unit other than the issuer's own exists at the location
    /// and fills in its type.
    fn other_unit(&self, unit: &mut OrderUnit) -> Result<UnitType, OrderError> {
        let p = unit.province();
        let actual = self
            .ctx
            .position
            .unit(p)
            .copied()
            .ok_or_else(|| OrderError::NoUnit {
                province: self.name(p),
            })?;
        self.fill_type(unit, actual.unit_type)?;
        unit.location.coast = actual.coast;
        Ok(actual.unit_type)
    }

    /// Resolves the coast of a destination for a unit moving from `src`.
    fn resolve_dest(
        &self,
        src: Location,
        unit_type: UnitType,
        dest: &mut Location,
    ) -> Result<(), OrderError> {
        let map = self.ctx.map;
        let info = map.info(dest.province);
        if unit_type != UnitType::Fleet || !info.has_coasts() {
            if !dest.coast.is_none() && !info.coasts.contains(&dest.coast) {
                return Err(OrderError::InvalidCoast {
                    province: self.name(dest.province),
                    coast: dest.coast.abbr().to_string(),
                });
            }
            dest.coast = Coast::None;
            return Ok(());
        }
        if dest.coast.is_none() {
            let coasts = map.fleet_coasts_to(src, dest.province);
            match coasts.as_slice() {
                [only] => dest.coast = *only,
                [] => {
                    return Err(OrderError::NotAdjacent {
                        from: self.name(src.province),
                        to: self.name(dest.province),
                    })
                }
                _ => {
                    return Err(OrderError::CoastRequired {
                        province: self.name(dest.province),
                    })
                }
            }
        } else if !info.coasts.contains(&dest.coast) {
            return Err(OrderError::InvalidCoast {
                province: self.name(dest.province),
                coast: dest.coast.abbr().to_string(),
            });
        }
        Ok(())
    }

    fn check_border(
        &self,
        src: ProvinceId,
        dst: ProvinceId,
        unit_type: UnitType,
        kind: OrderKind,
    ) -> Result<(), OrderError> {
        match self
            .ctx
            .map
            .transit_blocker(src, dst, unit_type, self.ctx.phase.kind, kind)
        {
            Some(border) => Err(OrderError::BorderProhibits {
                border: border.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Whether a unit could move into some part of `dst`.
    fn can_reach(&self, src: Location, unit_type: UnitType, dst: ProvinceId) -> bool {
        let map = self.ctx.map;
        match unit_type {
            UnitType::Fleet => !map.fleet_coasts_to(src, dst).is_empty(),
            _ => map.is_adjacent(src, Location::new(dst), unit_type),
        }
    }

    fn validate_move(
        &self,
        unit: &mut OrderUnit,
        dest: &mut Location,
        by_convoy: &mut bool,
        via: &mut Vec<ProvinceId>,
    ) -> Result<(), OrderError> {
        let map = self.ctx.map;
        let unit_type = self.own_unit(unit)?;
        let (src, dst) = (unit.province(), dest.province);
        if src == dst {
            return Err(OrderError::SameProvince);
        }
        if !map.can_occupy(dst, unit_type) {
            return Err(OrderError::CannotOccupy {
                province: self.name(dst),
                unit: unit_type,
            });
        }

        if unit_type != UnitType::Army {
            *by_convoy = false;
            via.clear();
            self.resolve_dest(unit.location, unit_type, dest)?;
            if !map.is_adjacent(unit.location, *dest, unit_type) {
                return Err(OrderError::NotAdjacent {
                    from: self.name(src),
                    to: self.name(dst),
                });
            }
            return self.check_border(src, dst, unit_type, OrderKind::Move);
        }

        dest.coast = Coast::None;
        if self.ctx.rules.convoy_routes == ConvoyRoutes::Implicit {
            via.clear();
        }
        let adjacent = map.is_adjacent(unit.location, *dest, UnitType::Army);
        let wants_convoy = *by_convoy || !via.is_empty() || !adjacent;
        if !wants_convoy {
            return self.check_border(src, dst, unit_type, OrderKind::Move);
        }

        let position = self.ctx.position;
        if !via.is_empty() {
            if !path::explicit_route_is_possible(map, position, src, dst, via) {
                return Err(OrderError::InvalidRoute);
            }
        } else if self.ctx.rules.convoy_routes == ConvoyRoutes::Explicit {
            return Err(OrderError::RouteRequired);
        } else if !path::theoretical_route_exists(map, position, src, dst) {
            return Err(if adjacent {
                OrderError::NoConvoyRoute {
                    from: self.name(src),
                    to: self.name(dst),
                }
            } else {
                OrderError::NotAdjacent {
                    from: self.name(src),
                    to: self.name(dst),
                }
            });
        }
        Ok(())
    }

    fn validate_support_hold(
        &self,
        unit: &mut OrderUnit,
        supported: &mut OrderUnit,
    ) -> Result<(), OrderError> {
        let unit_type = self.own_unit(unit)?;
        let target = supported.province();
        if target == unit.province() {
            return Err(OrderError::SupportSelf);
        }
        self.other_unit(supported)?;
        if !self.can_reach(unit.location, unit_type, target) {
            return Err(OrderError::SupportUnreachable {
                province: self.name(target),
            });
        }
        self.check_border(unit.province(), target, unit_type, OrderKind::SupportHold)
    }

    fn validate_support_move(
        &self,
        unit: &mut OrderUnit,
        supported: &mut OrderUnit,
        dest: &mut Location,
    ) -> Result<(), OrderError> {
        let unit_type = self.own_unit(unit)?;
        if supported.province() == unit.province() {
            return Err(OrderError::SupportSelf);
        }
        let supported_type = self.other_unit(supported)?;
        let dst = dest.province;
        dest.coast = Coast::None;
        if dst == supported.province() {
            return Err(OrderError::SameProvince);
        }
        if !self.can_reach(unit.location, unit_type, dst) {
            return Err(OrderError::SupportUnreachable {
                province: self.name(dst),
            });
        }
        let map = self.ctx.map;
        let reachable = map.can_occupy(dst, supported_type)
            && (self.can_reach(supported.location, supported_type, dst)
                || (supported_type == UnitType::Army
                    && path::theoretical_route_exists(
                        map,
                        self.ctx.position,
                        supported.province(),
                        dst,
                    )));
        if !reachable {
            return Err(OrderError::SupportedUnreachable {
                province: self.name(dst),
            });
        }
        self.check_border(unit.province(), dst, unit_type, OrderKind::SupportMove)
    }

    fn validate_convoy(
        &self,
        unit: &mut OrderUnit,
        from: &mut Location,
        to: &mut Location,
    ) -> Result<(), OrderError> {
        let map = self.ctx.map;
        let unit_type = self.own_unit(unit)?;
        if unit_type != UnitType::Fleet {
            return Err(OrderError::ConvoyNotFleet);
        }
        let at = unit.province();
        if !map.is_convoyable(at) {
            return Err(OrderError::ConvoyNotAtSea {
                province: self.name(at),
            });
        }
        let mut army = OrderUnit::untyped(*from);
        if self.other_unit(&mut army)? != UnitType::Army {
            return Err(OrderError::ConvoyedNotArmy);
        }
        from.coast = Coast::None;
        to.coast = Coast::None;
        if from.province == to.province {
            return Err(OrderError::SameProvince);
        }
        if !map.can_occupy(to.province, UnitType::Army) {
            return Err(OrderError::CannotOccupy {
                province: self.name(to.province),
                unit: UnitType::Army,
            });
        }
        if !path::theoretical_route_through(map, self.ctx.position, from.province, to.province, at)
        {
            return Err(OrderError::NoRouteThrough {
                from: self.name(from.province),
                to: self.name(to.province),
                via: self.name(at),
            });
        }
        Ok(())
    }

    fn validate_retreat(&self, unit: &mut OrderUnit, dest: &mut Location) -> Result<(), OrderError> {
        let unit_type = self.dislodged_unit(unit)?;
        if dest.province == unit.province() {
            return Err(OrderError::SameProvince);
        }
        self.resolve_dest(unit.location, unit_type, dest)?;
        let valid = match self.ctx.retreats {
            Some(checker) => checker.is_valid(unit.location, unit_type, *dest),
            None => false,
        };
        if !valid {
            return Err(OrderError::InvalidRetreat {
                province: self.name(dest.province),
            });
        }
        Ok(())
    }

    fn validate_build(&self, unit: &mut OrderUnit) -> Result<(), OrderError> {
        let map = self.ctx.map;
        let position = self.ctx.position;
        let p = unit.province();
        let unit_type = unit.unit_type.ok_or(OrderError::UnitTypeRequired)?;
        self.check_wing(unit_type)?;

        if self.adjustment() <= 0 {
            return Err(OrderError::NoBuildsAvailable);
        }
        if !map.is_supply_center(p) {
            return Err(OrderError::NotSupplyCenter {
                province: self.name(p),
            });
        }
        if position.sc_owner(p) != Some(self.power) {
            return Err(OrderError::CenterNotOwned {
                province: self.name(p),
            });
        }
        if position.unit(p).is_some() {
            return Err(OrderError::CenterOccupied {
                province: self.name(p),
            });
        }
        match self.ctx.rules.builds {
            BuildRule::HomeOnly if map.home_power(p) != Some(self.power) => {
                return Err(OrderError::NotHomeCenter {
                    province: self.name(p),
                })
            }
            BuildRule::AnyIfHomeOwned
                if !map
                    .home_centers(self.power)
                    .any(|h| position.sc_owner(h) == Some(self.power)) =>
            {
                return Err(OrderError::NoHomeCenterOwned)
            }
            _ => {}
        }
        if !map.can_occupy(p, unit_type) {
            return Err(OrderError::CannotOccupy {
                province: self.name(p),
                unit: unit_type,
            });
        }

        let info = map.info(p);
        let coast = unit.location.coast;
        if unit_type == UnitType::Fleet && info.has_coasts() {
            if coast.is_none() {
                return Err(OrderError::CoastRequired {
                    province: self.name(p),
                });
            }
            if !info.coasts.contains(&coast) {
                return Err(OrderError::InvalidCoast {
                    province: self.name(p),
                    coast: coast.abbr().to_string(),
                });
            }
        } else {
            unit.location.coast = Coast::None;
        }
        Ok(())
    }
}
