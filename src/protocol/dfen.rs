//! DFEN (Diplomacy FEN) encoding and decoding.
//!
//! DFEN is a one-line notation for a whole board position, inspired by
//! chess FEN: phase, units, supply-center owners and dislodged units.
//!
//! Format: `<phase_info>/<units>/<supply_centers>/<dislodged>`
//!
//! - phase info: year, season (`s`/`f`) and phase (`m`/`r`/`b`), e.g. `1901sm`
//! - units: `<power><type><province>[.<coast>]`, e.g. `Aavie`, `Rfstp.sc`
//! - supply centers: `<power><province>`, `N` for neutral, e.g. `Abud`, `Nbel`
//! - dislodged: a unit followed by `<` and the attacker's province, with a
//!   trailing `*` when the attack came by convoy, e.g. `Aaser<bul`
//!
//! Empty unit and dislodged sections are written as `-`. Power letters come
//! from the variant map.

use crate::board::{
    Coast, DislodgedUnit, Phase, PhaseKind, Position, PowerId, ProvinceId, Season, Unit, UnitType,
    WorldMap,
};

/// Errors that can occur during DFEN parsing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DfenError {
    #[error("expected 4 sections separated by '/', got {0}")]
    WrongSectionCount(usize),

    #[error("invalid year in phase info: '{0}'")]
    InvalidYear(String),

    #[error("invalid season character: '{0}'")]
    InvalidSeason(char),

    #[error("invalid phase character: '{0}'")]
    InvalidPhase(char),

    #[error("invalid power character: '{0}'")]
    InvalidPower(char),

    #[error("invalid unit type character: '{0}'")]
    InvalidUnitType(char),

    #[error("unknown province abbreviation: '{0}'")]
    UnknownProvince(String),

    #[error("invalid coast abbreviation: '{0}'")]
    InvalidCoast(String),

    #[error("duplicate unit at province '{0}'")]
    DuplicateUnit(String),

    #[error("duplicate dislodged unit at province '{0}'")]
    DuplicateDislodged(String),

    #[error("invalid unit entry: '{0}'")]
    InvalidUnitEntry(String),

    #[error("invalid SC entry: '{0}'")]
    InvalidScEntry(String),

    #[error("'{0}' is not a supply center")]
    NotSupplyCenter(String),

    #[error("invalid dislodged entry: '{0}'")]
    InvalidDislodgedEntry(String),

    #[error("phase info too short: '{0}'")]
    PhaseInfoTooShort(String),
}

/// Parses a DFEN string against `map`.
pub fn parse_dfen(map: &WorldMap, s: &str) -> Result<(Phase, Position), DfenError> {
    let sections: Vec<&str> = s.trim().split('/').collect();
    if sections.len() != 4 {
        return Err(DfenError::WrongSectionCount(sections.len()));
    }

    let phase = parse_phase_info(sections[0])?;
    let mut position = Position::empty(map);
    parse_units(map, sections[1], &mut position)?;
    parse_supply_centers(map, sections[2], &mut position)?;
    parse_dislodged(map, sections[3], &mut position)?;
    Ok((phase, position))
}

/// Parses the phase info section (e.g., "1901sm").
fn parse_phase_info(s: &str) -> Result<Phase, DfenError> {
    let mut chars = s.chars().rev();
    let (Some(kind_char), Some(season_char)) = (chars.next(), chars.next()) else {
        return Err(DfenError::PhaseInfoTooShort(s.to_string()));
    };
    let year_str: String = chars.rev().collect();
    if year_str.is_empty() {
        return Err(DfenError::PhaseInfoTooShort(s.to_string()));
    }

    let year: u16 = year_str
        .parse()
        .map_err(|_| DfenError::InvalidYear(year_str.clone()))?;
    let season =
        Season::from_dfen_char(season_char).ok_or(DfenError::InvalidSeason(season_char))?;
    let kind = PhaseKind::from_dfen_char(kind_char).ok_or(DfenError::InvalidPhase(kind_char))?;
    Ok(Phase::new(year, season, kind))
}

fn parse_power(map: &WorldMap, c: char) -> Result<PowerId, DfenError> {
    if !c.is_ascii_uppercase() {
        return Err(DfenError::InvalidPower(c));
    }
    map.power_by_abbr(c).ok_or(DfenError::InvalidPower(c))
}

/// Parses a location like "vie" or "stp.sc".
fn parse_location(map: &WorldMap, s: &str) -> Result<(ProvinceId, Coast), DfenError> {
    let (prov, coast) = match s.split_once('.') {
        Some((prov, coast_str)) => {
            let coast = Coast::from_abbr(coast_str)
                .filter(|c| !c.is_none())
                .ok_or_else(|| DfenError::InvalidCoast(coast_str.to_string()))?;
            (prov, coast)
        }
        None => (s, Coast::None),
    };
    let province = map
        .province(prov)
        .ok_or_else(|| DfenError::UnknownProvince(prov.to_string()))?;
    Ok((province, coast))
}

/// Parses `<power><type><location>`. `invalid` builds the error for a
/// malformed entry.
fn parse_unit(
    map: &WorldMap,
    entry: &str,
    invalid: impl Fn() -> DfenError,
) -> Result<(ProvinceId, Unit), DfenError> {
    let mut chars = entry.chars();
    let (Some(power_char), Some(unit_char)) = (chars.next(), chars.next()) else {
        return Err(invalid());
    };
    let location = chars.as_str();
    if location.is_empty() {
        return Err(invalid());
    }
    let power = parse_power(map, power_char)?;
    let unit_type =
        UnitType::from_dui_char(unit_char).ok_or(DfenError::InvalidUnitType(unit_char))?;
    let (province, coast) = parse_location(map, location)?;
    Ok((province, Unit::with_coast(unit_type, power, coast)))
}

/// Parses the units section (comma-separated entries or "-").
fn parse_units(map: &WorldMap, s: &str, position: &mut Position) -> Result<(), DfenError> {
    if s == "-" {
        return Ok(());
    }
    for entry in s.split(',') {
        let (province, unit) =
            parse_unit(map, entry, || DfenError::InvalidUnitEntry(entry.to_string()))?;
        if !position.place_unit(province, unit) {
            return Err(DfenError::DuplicateUnit(map.abbr(province).to_string()));
        }
    }
    Ok(())
}

/// Parses the supply centers section. Centers left out are neutral.
fn parse_supply_centers(map: &WorldMap, s: &str, position: &mut Position) -> Result<(), DfenError> {
    if s == "-" {
        return Ok(());
    }
    for entry in s.split(',') {
        let mut chars = entry.chars();
        let (Some(power_char), prov) = (chars.next(), chars.as_str()) else {
            return Err(DfenError::InvalidScEntry(entry.to_string()));
        };
        if prov.is_empty() {
            return Err(DfenError::InvalidScEntry(entry.to_string()));
        }
        let owner = match power_char {
            'N' => None,
            c => Some(parse_power(map, c)?),
        };
        let province = map
            .province(prov)
            .ok_or_else(|| DfenError::UnknownProvince(prov.to_string()))?;
        if !map.is_supply_center(province) {
            return Err(DfenError::NotSupplyCenter(prov.to_string()));
        }
        position.set_sc_owner(province, owner);
    }
    Ok(())
}

/// Parses the dislodged units section (comma-separated entries or "-").
fn parse_dislodged(map: &WorldMap, s: &str, position: &mut Position) -> Result<(), DfenError> {
    if s == "-" {
        return Ok(());
    }
    for entry in s.split(',') {
        let invalid = || DfenError::InvalidDislodgedEntry(entry.to_string());
        let (unit_part, attacker) = entry.split_once('<').ok_or_else(invalid)?;
        let (attacker, by_convoy) = match attacker.strip_suffix('*') {
            Some(a) => (a, true),
            None => (attacker, false),
        };
        let (province, unit) = parse_unit(map, unit_part, invalid)?;
        let attacker_from = map
            .province(attacker)
            .ok_or_else(|| DfenError::UnknownProvince(attacker.to_string()))?;
        let dislodged = DislodgedUnit {
            unit,
            attacker_from,
            by_convoy,
        };
        if !position.set_dislodged(province, dislodged) {
            return Err(DfenError::DuplicateDislodged(map.abbr(province).to_string()));
        }
    }
    Ok(())
}

/// Encodes a location (province + optional coast) for DFEN output.
fn encode_location(map: &WorldMap, province: ProvinceId, coast: Coast) -> String {
    let abbr = map.abbr(province);
    if coast.is_none() {
        abbr.to_string()
    } else {
        format!("{abbr}.{}", coast.abbr())
    }
}

fn encode_unit(map: &WorldMap, province: ProvinceId, unit: &Unit) -> String {
    format!(
        "{}{}{}",
        map.power_info(unit.power).abbr,
        unit.unit_type.dui_char(),
        encode_location(map, province, unit.coast)
    )
}

/// Encodes a position as canonical DFEN.
///
/// Units and dislodged units are grouped by power in map order, then by
/// province order. Supply centers follow the same power order with the
/// neutral ones last.
pub fn encode_dfen(map: &WorldMap, phase: Phase, position: &Position) -> String {
    let mut units = Vec::new();
    let mut centers = Vec::new();
    let mut dislodged = Vec::new();

    for power in map.powers() {
        for (p, unit) in position.units().filter(|(_, u)| u.power == power) {
            units.push(encode_unit(map, p, unit));
        }
        for p in map.supply_centers() {
            if position.sc_owner(p) == Some(power) {
                centers.push(format!("{}{}", map.power_info(power).abbr, map.abbr(p)));
            }
        }
        for (p, d) in position
            .dislodged_units()
            .filter(|(_, d)| d.unit.power == power)
        {
            let convoy = if d.by_convoy { "*" } else { "" };
            dislodged.push(format!(
                "{}<{}{convoy}",
                encode_unit(map, p, &d.unit),
                map.abbr(d.attacker_from)
            ));
        }
    }
    for p in map.supply_centers() {
        if position.sc_owner(p).is_none() {
            centers.push(format!("N{}", map.abbr(p)));
        }
    }

    let section = |entries: Vec<String>| {
        if entries.is_empty() {
            "-".to_string()
        } else {
            entries.join(",")
        }
    };
    format!(
        "{}{}{}/{}/{}/{}",
        phase.year,
        phase.season.dfen_char(),
        phase.kind.dfen_char(),
        section(units),
        section(centers),
        section(dislodged)
    )
}
