//! DSON (Diplomacy Standard Order Notation) encoding and decoding.
//!
//! DSON is the compact order notation used by the `order` command and in
//! result messages. Province ids are the variant's abbreviations, the coast
//! separator is `/` and unit types are uppercase A/F/W.
//!
//! ```text
//! A vie H                  hold
//! A bud - rum              move
//! A lon - bel via          move, by convoy
//! A lon - bel via nth      move along a named convoy route
//! A gal S A bud - rum      support move
//! A tyr S A vie H          support hold
//! F mao C A bre - spa      convoy
//! A ser R alb              retreat
//! A ser D                  disband (retreat phase) or remove (adjustment)
//! F stp/sc B               build
//! W                        waive a build
//! A vie =                  state definition
//! ```
//!
//! The unit type may be left out (`vie - boh`); validation fills it in.

use thiserror::Error;

use crate::board::{Coast, Location, Order, OrderUnit, PhaseKind, ProvinceId, UnitType, WorldMap};

/// Errors that can occur when parsing DSON order strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DsonError {
    #[error("empty input")]
    EmptyInput,

    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("unknown province '{0}'")]
    UnknownProvince(String),

    #[error("unknown coast '{0}'")]
    UnknownCoast(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(String),

    #[error("unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },
}

/// Parses a single DSON order.
///
/// `phase` decides what `D` means: Disband in a retreat phase, Remove in
/// an adjustment phase.
pub fn parse_order(map: &WorldMap, s: &str, phase: PhaseKind) -> Result<Order, DsonError> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(DsonError::EmptyInput);
    }
    if tokens == ["W"] {
        return Ok(Order::Waive);
    }

    let mut p = Parser { map, tokens, pos: 0 };
    let unit = p.unit()?;
    let action = p.next("action (H, -, S, C, R, D, B, =)")?;

    let order = match action {
        "H" => Order::Hold { unit },
        "-" => {
            let dest = p.location()?;
            let (by_convoy, via) = p.route()?;
            Order::Move {
                unit,
                dest,
                by_convoy,
                via,
            }
        }
        "S" => {
            let supported = p.unit()?;
            match p.next("H or -")? {
                "H" => Order::SupportHold { unit, supported },
                "-" => {
                    let dest = p.location()?;
                    Order::SupportMove {
                        unit,
                        supported,
                        dest,
                    }
                }
                other => return Err(unexpected("H or -", other)),
            }
        }
        "C" => {
            // The convoyed unit is always an army.
            p.expect("A")?;
            let convoyed_from = p.location()?;
            p.expect("-")?;
            let convoyed_to = p.location()?;
            Order::Convoy {
                unit,
                convoyed_from,
                convoyed_to,
            }
        }
        "R" => {
            let dest = p.location()?;
            Order::Retreat { unit, dest }
        }
        "D" if phase == PhaseKind::Adjustment => Order::Remove { unit },
        "D" => Order::Disband { unit },
        "B" => Order::Build { unit },
        "=" => Order::DefineState { unit },
        other => return Err(DsonError::UnknownAction(other.to_string())),
    };

    match p.peek() {
        None => Ok(order),
        Some(extra) => Err(unexpected("end of order", extra)),
    }
}

/// Parses a ` ; `-separated list of DSON orders.
pub fn parse_orders(map: &WorldMap, s: &str, phase: PhaseKind) -> Result<Vec<Order>, DsonError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DsonError::EmptyInput);
    }
    s.split(';')
        .map(|part| parse_order(map, part, phase))
        .collect()
}

/// Formats an order as canonical DSON.
pub fn format_order(map: &WorldMap, order: &Order) -> String {
    let unit = |u: &OrderUnit| format_unit(map, u);
    let loc = |l: &Location| format_location(map, l);
    match order {
        Order::Hold { unit: u } => format!("{} H", unit(u)),
        Order::Move {
            unit: u,
            dest,
            by_convoy,
            via,
        } => {
            let mut s = format!("{} - {}", unit(u), loc(dest));
            if *by_convoy || !via.is_empty() {
                s.push_str(" via");
                for p in via {
                    s.push(' ');
                    s.push_str(map.abbr(*p));
                }
            }
            s
        }
        Order::SupportHold { unit: u, supported } => {
            format!("{} S {} H", unit(u), unit(supported))
        }
        Order::SupportMove {
            unit: u,
            supported,
            dest,
        } => format!("{} S {} - {}", unit(u), unit(supported), loc(dest)),
        Order::Convoy {
            unit: u,
            convoyed_from,
            convoyed_to,
        } => format!("{} C A {} - {}", unit(u), loc(convoyed_from), loc(convoyed_to)),
        Order::Retreat { unit: u, dest } => format!("{} R {}", unit(u), loc(dest)),
        Order::Disband { unit: u } | Order::Remove { unit: u } => format!("{} D", unit(u)),
        Order::Build { unit: u } => format!("{} B", unit(u)),
        Order::Waive => "W".to_string(),
        Order::DefineState { unit: u } => format!("{} =", unit(u)),
    }
}

/// Formats orders as a ` ; `-separated DSON string.
pub fn format_orders(map: &WorldMap, orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format_order(map, o))
        .collect::<Vec<_>>()
        .join(" ; ")
}

/// Formats a unit as "A prov", "F prov/coast" or just "prov" when its type
/// is not known yet.
fn format_unit(map: &WorldMap, unit: &OrderUnit) -> String {
    match unit.unit_type {
        Some(t) => format!("{} {}", t.dson_char(), format_location(map, &unit.location)),
        None => format_location(map, &unit.location),
    }
}

/// Formats a location as "prov" or "prov/coast".
pub fn format_location(map: &WorldMap, loc: &Location) -> String {
    let abbr = map.abbr(loc.province);
    if loc.coast == Coast::None {
        abbr.to_string()
    } else {
        format!("{abbr}/{}", loc.coast.abbr())
    }
}

fn unexpected(expected: &str, found: &str) -> DsonError {
    DsonError::UnexpectedToken {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

struct Parser<'a> {
    map: &'a WorldMap,
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self, expected: &str) -> Result<&'a str, DsonError> {
        let token = self
            .peek()
            .ok_or_else(|| DsonError::UnexpectedEnd(expected.to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, want: &str) -> Result<(), DsonError> {
        match self.next(want)? {
            t if t == want => Ok(()),
            other => Err(unexpected(want, other)),
        }
    }

    /// A unit: optional type character followed by a location.
    fn unit(&mut self) -> Result<OrderUnit, DsonError> {
        let token = self.next("unit (A, F or W)")?;
        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                let unit_type = UnitType::from_dson_char(c)
                    .ok_or_else(|| DsonError::UnknownUnitType(token.to_string()))?;
                return Ok(OrderUnit::new(unit_type, self.location()?));
            }
        }
        Ok(OrderUnit::untyped(self.parse_location(token)?))
    }

    fn location(&mut self) -> Result<Location, DsonError> {
        let token = self.next("province location")?;
        self.parse_location(token)
    }

    fn parse_location(&self, token: &str) -> Result<Location, DsonError> {
        let (prov, coast) = match token.split_once('/') {
            Some((prov, coast)) => {
                let coast = Coast::from_abbr(coast)
                    .ok_or_else(|| DsonError::UnknownCoast(coast.to_string()))?;
                (prov, coast)
            }
            None => (token, Coast::None),
        };
        let province = self
            .map
            .province(prov)
            .ok_or_else(|| DsonError::UnknownProvince(prov.to_string()))?;
        Ok(Location::with_coast(province, coast))
    }

    /// Optional `via [prov ...]` suffix of a move.
    fn route(&mut self) -> Result<(bool, Vec<ProvinceId>), DsonError> {
        if self.peek() != Some("via") {
            return Ok((false, Vec::new()));
        }
        self.pos += 1;
        let mut via = Vec::new();
        while let Some(token) = self.peek() {
            let province = self
                .map
                .province(token)
                .ok_or_else(|| DsonError::UnknownProvince(token.to_string()))?;
            via.push(province);
            self.pos += 1;
        }
        Ok((true, via))
    }
}
