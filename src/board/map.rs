//! Variant maps.
//!
//! A `WorldMap` is the read-only province graph the adjudicator queries:
//! terrain, coasts, adjacency per unit type, supply centers, home centers,
//! borders and victory conditions. Maps are described in TOML; the standard
//! map is embedded in the binary and available through
//! [`WorldMap::standard`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::LazyLock;

use serde::Deserialize;
use thiserror::Error;

use super::border::Border;
use super::order::{Location, OrderKind};
use super::province::{Coast, PowerId, PowerInfo, ProvinceId, ProvinceInfo, ProvinceType};
use super::state::PhaseKind;
use super::unit::{Unit, UnitType};

const STANDARD_TOML: &str = include_str!("../../variants/standard.toml");

static STANDARD: LazyLock<WorldMap> = LazyLock::new(|| {
    WorldMap::from_toml_str(STANDARD_TOML).expect("embedded standard variant is valid")
});

/// Errors raised while loading a variant description.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read variant file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse variant: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate province '{0}'")]
    DuplicateProvince(String),

    #[error("unknown province '{name}' referenced from '{context}'")]
    UnknownProvince { name: String, context: String },

    #[error("unknown power '{name}' referenced from '{context}'")]
    UnknownPower { name: String, context: String },

    #[error("invalid coast '{coast}' in '{context}'")]
    InvalidCoast { coast: String, context: String },

    #[error("power abbreviation must be a single letter, got '{0}'")]
    InvalidPowerAbbr(String),

    #[error("adjacency {from} -> {to} has no matching reverse entry")]
    Asymmetric { from: String, to: String },

    #[error("variant defines {0} provinces or powers, more than supported")]
    TooLarge(usize),

    #[error("invalid starting unit '{unit}' for {power}")]
    InvalidStartingUnit { unit: String, power: String },
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    name: String,
    victory_centers: usize,
    #[serde(default)]
    max_year: Option<u16>,
    #[serde(default = "default_start_year")]
    start_year: u16,
    powers: Vec<RawPower>,
    provinces: Vec<RawProvince>,
    #[serde(default)]
    borders: Vec<RawBorder>,
}

#[derive(Debug, Deserialize)]
struct RawPower {
    name: String,
    #[serde(default)]
    adjective: Option<String>,
    abbr: String,
    /// Starting units, e.g. "A vie" or "F stp/sc".
    #[serde(default)]
    units: Vec<String>,
}

fn default_start_year() -> u16 {
    1901
}

#[derive(Debug, Deserialize)]
struct RawProvince {
    abbr: String,
    name: String,
    terrain: ProvinceType,
    #[serde(default)]
    supply_center: bool,
    #[serde(default)]
    home: Option<String>,
    #[serde(default)]
    convoyable_coast: bool,
    #[serde(default)]
    army: Vec<String>,
    #[serde(default)]
    fleet: Vec<String>,
    #[serde(default)]
    coasts: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawBorder {
    id: String,
    between: [String; 2],
    #[serde(default)]
    from: Vec<String>,
    #[serde(default)]
    base_move_modifier: i32,
    #[serde(default)]
    prohibited_units: Vec<UnitType>,
    #[serde(default)]
    prohibited_orders: Vec<OrderKind>,
    #[serde(default)]
    prohibited_phases: Vec<PhaseKind>,
}

/// A single directed adjacency between two provinces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencyEntry {
    pub to: ProvinceId,
    pub from_coast: Coast,
    pub to_coast: Coast,
    pub army_ok: bool,
    pub fleet_ok: bool,
}

/// The read-only province graph of one variant.
#[derive(Debug, Clone)]
pub struct WorldMap {
    name: String,
    victory_centers: usize,
    max_year: Option<u16>,
    start_year: u16,
    starting_units: Vec<(ProvinceId, Unit)>,
    powers: Vec<PowerInfo>,
    provinces: Vec<ProvinceInfo>,
    by_abbr: HashMap<String, ProvinceId>,
    adjacency: Vec<Vec<AdjacencyEntry>>,
    borders: Vec<Border>,
    border_index: HashMap<(ProvinceId, ProvinceId), Vec<usize>>,
}

impl WorldMap {
    /// The embedded standard 75-province map.
    pub fn standard() -> &'static WorldMap {
        &STANDARD
    }

    /// Loads a variant from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parses a variant from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, MapError> {
        let raw: RawVariant = toml::from_str(text)?;
        Self::build(raw)
    }

    fn build(raw: RawVariant) -> Result<Self, MapError> {
        if raw.provinces.len() > u16::MAX as usize {
            return Err(MapError::TooLarge(raw.provinces.len()));
        }
        if raw.powers.len() > u8::MAX as usize {
            return Err(MapError::TooLarge(raw.powers.len()));
        }

        let mut powers = Vec::with_capacity(raw.powers.len());
        for p in &raw.powers {
            let mut chars = p.abbr.chars();
            let abbr = match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
                _ => return Err(MapError::InvalidPowerAbbr(p.abbr.clone())),
            };
            powers.push(PowerInfo {
                name: p.name.clone(),
                adjective: p.adjective.clone().unwrap_or_else(|| p.name.clone()),
                abbr,
            });
        }

        let mut by_abbr = HashMap::new();
        for (i, p) in raw.provinces.iter().enumerate() {
            let key = p.abbr.to_ascii_lowercase();
            if by_abbr.insert(key, ProvinceId(i as u16)).is_some() {
                return Err(MapError::DuplicateProvince(p.abbr.clone()));
            }
        }

        let lookup = |name: &str, context: &str| -> Result<ProvinceId, MapError> {
            by_abbr
                .get(&name.to_ascii_lowercase())
                .copied()
                .ok_or_else(|| MapError::UnknownProvince {
                    name: name.to_string(),
                    context: context.to_string(),
                })
        };
        let coast_of = |coast: &str, context: &str| -> Result<Coast, MapError> {
            Coast::from_abbr(coast).ok_or_else(|| MapError::InvalidCoast {
                coast: coast.to_string(),
                context: context.to_string(),
            })
        };
        // "spa/nc" -> (spa, North)
        let target = |spec: &str, context: &str| -> Result<(ProvinceId, Coast), MapError> {
            match spec.split_once('/') {
                Some((prov, coast)) => Ok((lookup(prov, context)?, coast_of(coast, context)?)),
                None => Ok((lookup(spec, context)?, Coast::None)),
            }
        };

        let mut provinces = Vec::with_capacity(raw.provinces.len());
        let mut adjacency: Vec<Vec<AdjacencyEntry>> = vec![Vec::new(); raw.provinces.len()];

        for (i, p) in raw.provinces.iter().enumerate() {
            let home_power = match &p.home {
                Some(name) => Some(
                    powers
                        .iter()
                        .position(|pw| pw.name.eq_ignore_ascii_case(name))
                        .map(|idx| PowerId(idx as u8))
                        .ok_or_else(|| MapError::UnknownPower {
                            name: name.clone(),
                            context: p.abbr.clone(),
                        })?,
                ),
                None => None,
            };

            let mut coasts = Vec::new();
            for coast in p.coasts.keys() {
                coasts.push(coast_of(coast, &p.abbr)?);
            }

            provinces.push(ProvinceInfo {
                abbr: p.abbr.to_ascii_lowercase(),
                name: p.name.clone(),
                province_type: p.terrain,
                is_supply_center: p.supply_center,
                home_power,
                coasts,
                convoyable_coast: p.convoyable_coast,
            });

            let entries = &mut adjacency[i];
            for n in &p.army {
                entries.push(AdjacencyEntry {
                    to: lookup(n, &p.abbr)?,
                    from_coast: Coast::None,
                    to_coast: Coast::None,
                    army_ok: true,
                    fleet_ok: false,
                });
            }
            for n in &p.fleet {
                let (to, to_coast) = target(n, &p.abbr)?;
                entries.push(AdjacencyEntry {
                    to,
                    from_coast: Coast::None,
                    to_coast,
                    army_ok: false,
                    fleet_ok: true,
                });
            }
            for (coast, list) in &p.coasts {
                let from_coast = coast_of(coast, &p.abbr)?;
                for n in list {
                    let (to, to_coast) = target(n, &p.abbr)?;
                    entries.push(AdjacencyEntry {
                        to,
                        from_coast,
                        to_coast,
                        army_ok: false,
                        fleet_ok: true,
                    });
                }
            }
        }

        // Every edge must exist in both directions with mirrored coasts.
        for (from, entries) in adjacency.iter().enumerate() {
            for e in entries {
                let mirrored = adjacency[e.to.index()].iter().any(|r| {
                    r.to.index() == from
                        && r.army_ok == e.army_ok
                        && r.fleet_ok == e.fleet_ok
                        && r.from_coast == e.to_coast
                        && r.to_coast == e.from_coast
                });
                if !mirrored {
                    return Err(MapError::Asymmetric {
                        from: provinces[from].abbr.clone(),
                        to: provinces[e.to.index()].abbr.clone(),
                    });
                }
            }
        }

        let mut starting_units = Vec::new();
        for (i, p) in raw.powers.iter().enumerate() {
            for spec in &p.units {
                let invalid = || MapError::InvalidStartingUnit {
                    unit: spec.clone(),
                    power: p.name.clone(),
                };
                let (kind, at) = spec.split_once(' ').ok_or_else(invalid)?;
                let unit_type = match kind.trim() {
                    "A" => UnitType::Army,
                    "F" => UnitType::Fleet,
                    "W" => UnitType::Wing,
                    _ => return Err(invalid()),
                };
                let (province, coast) = target(at.trim(), &p.name)?;
                let unit = Unit::with_coast(unit_type, PowerId(i as u8), coast);
                starting_units.push((province, unit));
            }
        }
        starting_units.sort_by_key(|(p, _)| *p);

        let mut borders = Vec::with_capacity(raw.borders.len());
        let mut border_index: HashMap<(ProvinceId, ProvinceId), Vec<usize>> = HashMap::new();
        for b in &raw.borders {
            let a = lookup(&b.between[0], &b.id)?;
            let c = lookup(&b.between[1], &b.id)?;
            let from = b
                .from
                .iter()
                .map(|f| lookup(f, &b.id))
                .collect::<Result<Vec<_>, _>>()?;
            border_index
                .entry(ordered(a, c))
                .or_default()
                .push(borders.len());
            borders.push(Border {
                id: b.id.clone(),
                between: (a, c),
                from,
                base_move_modifier: b.base_move_modifier,
                prohibited_units: b.prohibited_units.clone(),
                prohibited_orders: b.prohibited_orders.clone(),
                prohibited_phases: b.prohibited_phases.clone(),
            });
        }

        Ok(WorldMap {
            name: raw.name,
            victory_centers: raw.victory_centers,
            max_year: raw.max_year,
            start_year: raw.start_year,
            starting_units,
            powers,
            provinces,
            by_abbr,
            adjacency,
            borders,
            border_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Supply centers a single power must own to win outright.
    pub fn victory_centers(&self) -> usize {
        self.victory_centers
    }

    /// Last year played, if the variant limits game length.
    pub fn max_year(&self) -> Option<u16> {
        self.max_year
    }

    /// Year of the opening Spring movement phase.
    pub fn start_year(&self) -> u16 {
        self.start_year
    }

    /// Units on the board at the start of a game, sorted by province.
    pub fn starting_units(&self) -> &[(ProvinceId, Unit)] {
        &self.starting_units
    }

    // -- Provinces --

    pub fn province_count(&self) -> usize {
        self.provinces.len()
    }

    pub fn provinces(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        (0..self.provinces.len()).map(|i| ProvinceId(i as u16))
    }

    /// Looks up a province by abbreviation, case-insensitively.
    pub fn province(&self, abbr: &str) -> Option<ProvinceId> {
        self.by_abbr.get(&abbr.to_ascii_lowercase()).copied()
    }

    pub fn info(&self, p: ProvinceId) -> &ProvinceInfo {
        &self.provinces[p.index()]
    }

    pub fn abbr(&self, p: ProvinceId) -> &str {
        &self.provinces[p.index()].abbr
    }

    pub fn full_name(&self, p: ProvinceId) -> &str {
        &self.provinces[p.index()].name
    }

    pub fn is_supply_center(&self, p: ProvinceId) -> bool {
        self.provinces[p.index()].is_supply_center
    }

    pub fn home_power(&self, p: ProvinceId) -> Option<PowerId> {
        self.provinces[p.index()].home_power
    }

    pub fn is_sea(&self, p: ProvinceId) -> bool {
        self.provinces[p.index()].province_type == ProvinceType::Sea
    }

    /// Fleets in this province may take part in a convoy.
    pub fn is_convoyable(&self, p: ProvinceId) -> bool {
        let info = &self.provinces[p.index()];
        info.province_type == ProvinceType::Sea || info.convoyable_coast
    }

    /// Whether a unit of the given type may stand in the province at all.
    pub fn can_occupy(&self, p: ProvinceId, unit_type: UnitType) -> bool {
        match (unit_type, self.provinces[p.index()].province_type) {
            (UnitType::Army, ProvinceType::Sea) => false,
            (UnitType::Fleet, ProvinceType::Land) => false,
            _ => true,
        }
    }

    pub fn supply_centers(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        self.provinces().filter(move |&p| self.is_supply_center(p))
    }

    pub fn home_centers(&self, power: PowerId) -> impl Iterator<Item = ProvinceId> + '_ {
        self.provinces()
            .filter(move |&p| self.is_supply_center(p) && self.home_power(p) == Some(power))
    }

    // -- Powers --

    pub fn power_count(&self) -> usize {
        self.powers.len()
    }

    pub fn powers(&self) -> impl Iterator<Item = PowerId> + '_ {
        (0..self.powers.len()).map(|i| PowerId(i as u8))
    }

    pub fn power_info(&self, power: PowerId) -> &PowerInfo {
        &self.powers[power.index()]
    }

    pub fn power_name(&self, power: PowerId) -> &str {
        &self.powers[power.index()].name
    }

    /// Looks up a power by name or adjective, case-insensitively.
    pub fn power(&self, name: &str) -> Option<PowerId> {
        self.powers
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name) || p.adjective.eq_ignore_ascii_case(name))
            .map(|i| PowerId(i as u8))
    }

    pub fn power_by_abbr(&self, c: char) -> Option<PowerId> {
        let c = c.to_ascii_uppercase();
        self.powers
            .iter()
            .position(|p| p.abbr == c)
            .map(|i| PowerId(i as u8))
    }

    // -- Adjacency --

    pub fn adjacencies(&self, p: ProvinceId) -> &[AdjacencyEntry] {
        &self.adjacency[p.index()]
    }

    /// Checks if a unit of the given type can move from `src` to `dst`.
    ///
    /// Fleets respect coasts on both ends: `Coast::None` on a split-coast
    /// province matches nothing, so fleet orders must name the coast.
    /// Armies and wings ignore coasts. Wings may cross any edge.
    pub fn is_adjacent(&self, src: Location, dst: Location, unit_type: UnitType) -> bool {
        self.adjacency[src.province.index()].iter().any(|e| {
            e.to == dst.province
                && match unit_type {
                    UnitType::Army => e.army_ok,
                    UnitType::Wing => true,
                    UnitType::Fleet => {
                        e.fleet_ok && e.from_coast == src.coast && e.to_coast == dst.coast
                    }
                }
        })
    }

    /// Whether any edge at all joins the two provinces.
    pub fn touches(&self, a: ProvinceId, b: ProvinceId) -> bool {
        self.adjacency[a.index()].iter().any(|e| e.to == b)
    }

    /// Whether a fleet can sail between the two provinces on some coast
    /// pair. Used for convoy chains, where coasts never matter.
    pub fn fleet_touches(&self, a: ProvinceId, b: ProvinceId) -> bool {
        self.adjacency[a.index()]
            .iter()
            .any(|e| e.to == b && e.fleet_ok)
    }

    /// Returns the coasts of `dst` a fleet at `src` can reach.
    pub fn fleet_coasts_to(&self, src: Location, dst: ProvinceId) -> Vec<Coast> {
        let mut coasts: Vec<Coast> = self.adjacency[src.province.index()]
            .iter()
            .filter(|e| e.to == dst && e.fleet_ok && e.from_coast == src.coast)
            .map(|e| e.to_coast)
            .collect();
        coasts.sort();
        coasts.dedup();
        coasts
    }

    /// Locations a unit at `src` could move to, ignoring other units.
    pub fn neighbours(&self, src: Location, unit_type: UnitType) -> Vec<Location> {
        let mut out: Vec<Location> = self.adjacency[src.province.index()]
            .iter()
            .filter_map(|e| match unit_type {
                UnitType::Army if e.army_ok => Some(Location::new(e.to)),
                UnitType::Wing => Some(Location::new(e.to)),
                UnitType::Fleet if e.fleet_ok && e.from_coast == src.coast => {
                    Some(Location::with_coast(e.to, e.to_coast))
                }
                _ => None,
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Minimum number of steps from `from` to the nearest province in
    /// `targets`, walking every edge regardless of unit type.
    pub fn min_distance(&self, from: ProvinceId, targets: &[ProvinceId]) -> Option<u32> {
        if targets.is_empty() {
            return None;
        }
        let mut seen = vec![false; self.provinces.len()];
        let mut queue = VecDeque::new();
        seen[from.index()] = true;
        queue.push_back((from, 0u32));
        while let Some((p, d)) = queue.pop_front() {
            if targets.contains(&p) {
                return Some(d);
            }
            for e in &self.adjacency[p.index()] {
                if !seen[e.to.index()] {
                    seen[e.to.index()] = true;
                    queue.push_back((e.to, d + 1));
                }
            }
        }
        None
    }

    // -- Borders --

    /// Borders on the edge between `a` and `b`, in either direction.
    pub fn borders_between(&self, a: ProvinceId, b: ProvinceId) -> impl Iterator<Item = &Border> {
        self.border_index
            .get(&ordered(a, b))
            .into_iter()
            .flatten()
            .map(|&i| &self.borders[i])
    }

    /// Returns the first border forbidding the crossing, if any.
    pub fn transit_blocker(
        &self,
        src: ProvinceId,
        dst: ProvinceId,
        unit_type: UnitType,
        phase: PhaseKind,
        kind: OrderKind,
    ) -> Option<&Border> {
        self.borders_between(src, dst)
            .find(|b| b.prohibits(src, unit_type, phase, kind))
    }

    /// Sum of the base move modifiers of the borders crossed going from
    /// `src` to `dst`. Zero for ordinary edges.
    pub fn base_move_modifier(&self, src: ProvinceId, dst: ProvinceId) -> i32 {
        self.borders_between(src, dst)
            .filter(|b| b.applies_from(src))
            .map(|b| b.base_move_modifier)
            .sum()
    }
}

fn ordered(a: ProvinceId, b: ProvinceId) -> (ProvinceId, ProvinceId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
