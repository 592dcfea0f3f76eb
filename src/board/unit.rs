//! Unit types and ownership.
//!
//! Armies, fleets and (when the rule options allow them) wings, together
//! with their owning power and the coast they occupy.

use serde::{Deserialize, Serialize};

use super::province::{Coast, PowerId};

/// The type of a military unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Army,
    Fleet,
    Wing,
}

impl UnitType {
    /// Returns the single-character DFEN abbreviation.
    pub const fn dui_char(self) -> char {
        match self {
            UnitType::Army => 'a',
            UnitType::Fleet => 'f',
            UnitType::Wing => 'w',
        }
    }

    /// Returns the uppercase DSON abbreviation used in order notation.
    pub const fn dson_char(self) -> char {
        match self {
            UnitType::Army => 'A',
            UnitType::Fleet => 'F',
            UnitType::Wing => 'W',
        }
    }

    pub fn from_dui_char(c: char) -> Option<UnitType> {
        match c {
            'a' => Some(UnitType::Army),
            'f' => Some(UnitType::Fleet),
            'w' => Some(UnitType::Wing),
            _ => None,
        }
    }

    pub fn from_dson_char(c: char) -> Option<UnitType> {
        match c {
            'A' => Some(UnitType::Army),
            'F' => Some(UnitType::Fleet),
            'W' => Some(UnitType::Wing),
            _ => None,
        }
    }

    /// Rank used when civil disorder picks units to remove: fleets go
    /// first, then armies, then wings.
    pub(crate) const fn disband_rank(self) -> u8 {
        match self {
            UnitType::Fleet => 0,
            UnitType::Army => 1,
            UnitType::Wing => 2,
        }
    }
}

/// A military unit on the board. Its province is the key it is stored
/// under in the `Position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub unit_type: UnitType,
    pub power: PowerId,
    pub coast: Coast,
}

impl Unit {
    pub const fn new(unit_type: UnitType, power: PowerId) -> Self {
        Unit {
            unit_type,
            power,
            coast: Coast::None,
        }
    }

    pub const fn with_coast(unit_type: UnitType, power: PowerId, coast: Coast) -> Self {
        Unit {
            unit_type,
            power,
            coast,
        }
    }
}
