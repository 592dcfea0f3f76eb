//! Game state representation.
//!
//! A `Position` is the snapshot of the board the adjudicator reads: unit
//! placement, dislodged units, supply-center ownership and elimination
//! flags. A `Phase` names the point in the game calendar it belongs to.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::map::WorldMap;
use super::province::{PowerId, ProvinceId};
use super::unit::Unit;

/// The season of a game turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Fall,
}

impl Season {
    /// Returns the single-character DFEN abbreviation.
    pub const fn dfen_char(self) -> char {
        match self {
            Season::Spring => 's',
            Season::Fall => 'f',
        }
    }

    pub fn from_dfen_char(c: char) -> Option<Season> {
        match c {
            's' => Some(Season::Spring),
            'f' => Some(Season::Fall),
            _ => None,
        }
    }
}

/// The kind of phase within a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Movement,
    Retreat,
    Adjustment,
}

impl PhaseKind {
    /// Returns the single-character DFEN abbreviation.
    pub const fn dfen_char(self) -> char {
        match self {
            PhaseKind::Movement => 'm',
            PhaseKind::Retreat => 'r',
            PhaseKind::Adjustment => 'b',
        }
    }

    pub fn from_dfen_char(c: char) -> Option<PhaseKind> {
        match c {
            'm' => Some(PhaseKind::Movement),
            'r' => Some(PhaseKind::Retreat),
            'b' => Some(PhaseKind::Adjustment),
            _ => None,
        }
    }
}

/// A point in the game calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub year: u16,
    pub season: Season,
    pub kind: PhaseKind,
}

impl Phase {
    pub const fn new(year: u16, season: Season, kind: PhaseKind) -> Self {
        Phase { year, season, kind }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let season = match self.season {
            Season::Spring => "Spring",
            Season::Fall => "Fall",
        };
        let kind = match self.kind {
            PhaseKind::Movement => "Movement",
            PhaseKind::Retreat => "Retreat",
            PhaseKind::Adjustment => "Adjustment",
        };
        write!(f, "{season} {} {kind}", self.year)
    }
}

/// A dislodged unit with information about the attack that dislodged it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DislodgedUnit {
    pub unit: Unit,
    pub attacker_from: ProvinceId,
    pub by_convoy: bool,
}

/// Board snapshot. Vectors are indexed by `ProvinceId::index()` and
/// `PowerId::index()` and sized from the map the position was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    units: Vec<Option<Unit>>,
    dislodged: Vec<Option<DislodgedUnit>>,
    sc_owner: Vec<Option<PowerId>>,
    eliminated: Vec<bool>,
}

impl Position {
    /// Creates an empty position with no units or ownership.
    pub fn empty(map: &WorldMap) -> Self {
        let n = map.province_count();
        Position {
            units: vec![None; n],
            dislodged: vec![None; n],
            sc_owner: vec![None; n],
            eliminated: vec![false; map.power_count()],
        }
    }

    /// Every home center owned by its power, no units.
    pub fn with_home_centers(map: &WorldMap) -> Self {
        let mut position = Position::empty(map);
        for p in map.supply_centers() {
            position.sc_owner[p.index()] = map.home_power(p);
        }
        position
    }

    /// The variant's opening position: home centers plus starting units.
    pub fn opening(map: &WorldMap) -> Self {
        let mut position = Position::with_home_centers(map);
        for &(p, unit) in map.starting_units() {
            position.units[p.index()] = Some(unit);
        }
        position
    }

    pub fn unit(&self, p: ProvinceId) -> Option<&Unit> {
        self.units[p.index()].as_ref()
    }

    /// Places a unit on the board. Returns false if the province is
    /// already occupied.
    pub fn place_unit(&mut self, p: ProvinceId, unit: Unit) -> bool {
        let slot = &mut self.units[p.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(unit);
        true
    }

    pub fn remove_unit(&mut self, p: ProvinceId) -> Option<Unit> {
        self.units[p.index()].take()
    }

    /// All units in province order.
    pub fn units(&self) -> impl Iterator<Item = (ProvinceId, &Unit)> {
        self.units
            .iter()
            .enumerate()
            .filter_map(|(i, u)| u.as_ref().map(|u| (ProvinceId(i as u16), u)))
    }

    pub fn dislodged(&self, p: ProvinceId) -> Option<&DislodgedUnit> {
        self.dislodged[p.index()].as_ref()
    }

    /// Records a dislodged unit. Returns false if one is already there.
    pub fn set_dislodged(&mut self, p: ProvinceId, unit: DislodgedUnit) -> bool {
        let slot = &mut self.dislodged[p.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(unit);
        true
    }

    pub fn dislodged_units(&self) -> impl Iterator<Item = (ProvinceId, &DislodgedUnit)> {
        self.dislodged
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().map(|d| (ProvinceId(i as u16), d)))
    }

    pub fn has_dislodged(&self) -> bool {
        self.dislodged.iter().any(Option::is_some)
    }

    pub fn sc_owner(&self, p: ProvinceId) -> Option<PowerId> {
        self.sc_owner[p.index()]
    }

    pub fn set_sc_owner(&mut self, p: ProvinceId, owner: Option<PowerId>) {
        self.sc_owner[p.index()] = owner;
    }

    pub fn is_eliminated(&self, power: PowerId) -> bool {
        self.eliminated[power.index()]
    }

    pub fn set_eliminated(&mut self, power: PowerId, eliminated: bool) {
        self.eliminated[power.index()] = eliminated;
    }

    pub fn unit_count(&self, power: PowerId) -> usize {
        self.units().filter(|(_, u)| u.power == power).count()
    }

    pub fn center_count(&self, power: PowerId) -> usize {
        self.sc_owner.iter().filter(|o| **o == Some(power)).count()
    }

    /// Copy with every unit (and dislodged unit) removed.
    pub fn clone_without_units(&self) -> Self {
        Position {
            units: vec![None; self.units.len()],
            dislodged: vec![None; self.dislodged.len()],
            sc_owner: self.sc_owner.clone(),
            eliminated: self.eliminated.clone(),
        }
    }

    /// Copy with the dislodged units removed.
    pub fn clone_without_dislodged(&self) -> Self {
        Position {
            units: self.units.clone(),
            dislodged: vec![None; self.dislodged.len()],
            sc_owner: self.sc_owner.clone(),
            eliminated: self.eliminated.clone(),
        }
    }
}
