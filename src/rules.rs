//! Rule and validation options.
//!
//! `RuleOptions` selects between the rule variants the adjudicator
//! supports. It can be loaded from TOML, and it also offers a flat
//! key/value view used by the `setoption` protocol command.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unknown rule option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for rule option '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where a power may build new units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildRule {
    /// Only in unoccupied, owned home supply centers.
    #[default]
    HomeOnly,
    /// In any unoccupied, owned supply center.
    AnyOwned,
    /// In any unoccupied, owned supply center, provided at least one home
    /// supply center is still owned.
    AnyIfHomeOwned,
}

/// How convoy routes are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConvoyRoutes {
    /// Any chain of convoying fleets will do.
    #[default]
    Implicit,
    /// A convoyed move must name its route and only that route counts.
    Explicit,
    /// A named route is honoured; otherwise any route.
    Either,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleOptions {
    pub builds: BuildRule,
    pub wings: bool,
    pub convoy_routes: ConvoyRoutes,
}

impl RuleOptions {
    /// Option keys accepted by [`RuleOptions::set_option_value`].
    pub const KEYS: [&'static str; 3] = ["builds", "wings", "convoy_routes"];

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RuleError> {
        Ok(toml::from_str(text)?)
    }

    /// Returns the current value of a named option.
    pub fn get_option_value(&self, key: &str) -> Result<&'static str, RuleError> {
        match key {
            "builds" => Ok(match self.builds {
                BuildRule::HomeOnly => "home-only",
                BuildRule::AnyOwned => "any-owned",
                BuildRule::AnyIfHomeOwned => "any-if-home-owned",
            }),
            "wings" => Ok(if self.wings { "true" } else { "false" }),
            "convoy_routes" => Ok(match self.convoy_routes {
                ConvoyRoutes::Implicit => "implicit",
                ConvoyRoutes::Explicit => "explicit",
                ConvoyRoutes::Either => "either",
            }),
            other => Err(RuleError::UnknownOption(other.to_string())),
        }
    }

    /// Sets a named option from its textual value.
    pub fn set_option_value(&mut self, key: &str, value: &str) -> Result<(), RuleError> {
        let invalid = || RuleError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "builds" => {
                self.builds = match value {
                    "home-only" => BuildRule::HomeOnly,
                    "any-owned" => BuildRule::AnyOwned,
                    "any-if-home-owned" => BuildRule::AnyIfHomeOwned,
                    _ => return Err(invalid()),
                }
            }
            "wings" => self.wings = value.parse().map_err(|_| invalid())?,
            "convoy_routes" => {
                self.convoy_routes = match value {
                    "implicit" => ConvoyRoutes::Implicit,
                    "explicit" => ConvoyRoutes::Explicit,
                    "either" => ConvoyRoutes::Either,
                    _ => return Err(invalid()),
                }
            }
            other => return Err(RuleError::UnknownOption(other.to_string())),
        }
        Ok(())
    }
}

/// How forgiving order validation is about details the position can fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Mismatched unit types are errors.
    #[default]
    Strict,
    /// Mismatched unit types are corrected from the position.
    Loose,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub strictness: Strictness,
}

impl ValidationOptions {
    pub const STRICT: ValidationOptions = ValidationOptions {
        strictness: Strictness::Strict,
    };
    pub const LOOSE: ValidationOptions = ValidationOptions {
        strictness: Strictness::Loose,
    };
}
