//! Province, coast and power identifiers.
//!
//! Variants are loaded at runtime, so provinces and powers are addressed by
//! dense integer ids assigned in load order. Per-province data lives in
//! plain vectors indexed by `ProvinceId::index()`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense index of a province within a loaded `WorldMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProvinceId(pub u16);

impl ProvinceId {
    /// Returns the id as a vector index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProvinceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dense index of a power within a loaded `WorldMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PowerId(pub u8);

impl PowerId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Coast specifier for split-coast provinces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coast {
    None,
    North,
    South,
    East,
    West,
}

impl Coast {
    /// Returns the 2-letter abbreviation (empty string for None).
    pub const fn abbr(self) -> &'static str {
        match self {
            Coast::None => "",
            Coast::North => "nc",
            Coast::South => "sc",
            Coast::East => "ec",
            Coast::West => "wc",
        }
    }

    /// Parses a coast from its 2-letter abbreviation.
    pub fn from_abbr(s: &str) -> Option<Coast> {
        match s.to_ascii_lowercase().as_str() {
            "" => Some(Coast::None),
            "nc" => Some(Coast::North),
            "sc" => Some(Coast::South),
            "ec" => Some(Coast::East),
            "wc" => Some(Coast::West),
            _ => Option::None,
        }
    }

    pub const fn is_none(self) -> bool {
        matches!(self, Coast::None)
    }
}

/// Classifies a province by terrain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvinceType {
    Land,
    Sea,
    Coastal,
}

/// Static metadata for a single province.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvinceInfo {
    pub abbr: String,
    pub name: String,
    pub province_type: ProvinceType,
    pub is_supply_center: bool,
    pub home_power: Option<PowerId>,
    /// Named coasts, empty for provinces without split coasts.
    pub coasts: Vec<Coast>,
    /// Coastal province whose fleets may convoy (e.g. canal cities).
    pub convoyable_coast: bool,
}

impl ProvinceInfo {
    pub fn has_coasts(&self) -> bool {
        !self.coasts.is_empty()
    }
}

/// Static metadata for a single power.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerInfo {
    pub name: String,
    pub adjective: String,
    /// Uppercase single-letter abbreviation used by DFEN.
    pub abbr: char,
}
