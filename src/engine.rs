//! Engine state management.
//!
//! Holds the variant, the active rule options and the turn being filled
//! with orders, and answers protocol commands against them. Every handler
//! writes its reply to the given writer so tests can capture the output.

use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::board::{Phase, PhaseKind, Position, Season, WorldMap};
use crate::protocol::dfen::{encode_dfen, parse_dfen, DfenError};
use crate::protocol::dson::{format_order, parse_orders, DsonError};
use crate::protocol::parser::Command;
use crate::resolve::{adjudicate, AdjudicationError, GameOver, OrderResult, TurnResult, TurnState};
use crate::rules::{RuleError, RuleOptions};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown power '{0}'")]
    UnknownPower(String),

    #[error("setoption {0}: missing value")]
    MissingValue(String),

    #[error(transparent)]
    Dfen(#[from] DfenError),

    #[error(transparent)]
    Dson(#[from] DsonError),

    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error(transparent)]
    Adjudication(#[from] AdjudicationError),

    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// What the main loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Holds the mutable state of the engine between commands.
pub struct Engine<'m> {
    map: &'m WorldMap,
    rules: RuleOptions,
    turn: TurnState,
    previous: Option<TurnState>,
    json: bool,
}

impl<'m> Engine<'m> {
    /// Creates an engine at the variant's opening position.
    pub fn new(map: &'m WorldMap, rules: RuleOptions) -> Self {
        Engine {
            map,
            rules,
            turn: opening_turn(map),
            previous: None,
            json: false,
        }
    }

    /// Emit results as JSON objects instead of text.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn rules(&self) -> &RuleOptions {
        &self.rules
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// Runs one command. Errors are reported on `out` as an `error` line
    /// and the engine keeps going; only a failed write is returned.
    pub fn dispatch<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<Flow> {
        let outcome = match command {
            Command::Tribunal => self.handle_tribunal(out),
            Command::IsReady => self.handle_isready(out),
            Command::SetOption { name, value } => self.set_option(&name, value.as_deref()),
            Command::NewGame => {
                self.new_game();
                Ok(())
            }
            Command::Position { dfen } => self.set_position(&dfen),
            Command::Order { power, orders } => self.add_orders(&power, &orders),
            Command::Adjudicate => self.handle_adjudicate(out),
            Command::Show => self.handle_show(out),
            Command::Quit => return Ok(Flow::Quit),
        };
        match outcome {
            Ok(()) => {}
            Err(EngineError::Io(e)) => return Err(e),
            Err(e) => {
                writeln!(out, "error {e}")?;
                out.flush()?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Resets to the opening position, keeping the rule options.
    pub fn new_game(&mut self) {
        self.turn = opening_turn(self.map);
        self.previous = None;
    }

    /// Replaces the current turn with the position from a DFEN string.
    /// Orders queued for the old turn are dropped.
    pub fn set_position(&mut self, dfen: &str) -> Result<(), EngineError> {
        let (phase, position) = parse_dfen(self.map, dfen)?;
        debug!(%phase, "position set");
        self.turn = TurnState::new(phase, position);
        self.previous = None;
        Ok(())
    }

    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        let value = value.ok_or_else(|| EngineError::MissingValue(name.to_string()))?;
        self.rules.set_option_value(name, value)?;
        debug!(option = name, value, "rule option set");
        Ok(())
    }

    /// Queues DSON orders for a power given by name or adjective. Nothing
    /// is queued if any order in the list fails to parse.
    pub fn add_orders(&mut self, power: &str, dson: &str) -> Result<(), EngineError> {
        let power_id = self
            .map
            .power(power)
            .ok_or_else(|| EngineError::UnknownPower(power.to_string()))?;
        let orders = parse_orders(self.map, dson, self.turn.phase().kind)?;
        for order in orders {
            self.turn.add_order(power_id, order)?;
        }
        Ok(())
    }

    /// Handles the handshake: id lines, one line per rule option, then
    /// `tribunalok`.
    pub fn handle_tribunal<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        writeln!(out, "id name tribunal {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "id variant {}", self.map.name())?;
        for key in RuleOptions::KEYS {
            let default = RuleOptions::default().get_option_value(key)?;
            let current = self.rules.get_option_value(key)?;
            writeln!(out, "option name {key} default {default} value {current}")?;
        }
        writeln!(out, "tribunalok")?;
        out.flush()?;
        Ok(())
    }

    pub fn handle_isready<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        writeln!(out, "readyok")?;
        out.flush()?;
        Ok(())
    }

    /// Prints the current turn's position.
    pub fn handle_show<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        let dfen = encode_dfen(self.map, self.turn.phase(), self.turn.position());
        writeln!(out, "position {dfen}")?;
        out.flush()?;
        Ok(())
    }

    /// Adjudicates the current turn, prints its result log and moves on
    /// to the next turn. Prints `gameover` instead of `next` when the game
    /// ended; the finished turn stays current.
    pub fn handle_adjudicate<W: Write>(&mut self, out: &mut W) -> Result<(), EngineError> {
        let adjudication = adjudicate(self.map, &self.rules, &mut self.turn, self.previous.as_ref())?;
        let phase = self.turn.phase();
        info!(
            %phase,
            results = self.turn.results().len(),
            paradox = adjudication.unresolved_paradox,
            "turn adjudicated"
        );

        for result in self.turn.results() {
            self.write_result(result, out)?;
        }
        if adjudication.unresolved_paradox {
            writeln!(out, "paradox unresolved")?;
        }

        match (adjudication.next, adjudication.game_over) {
            (Some(next), _) => {
                let dfen = encode_dfen(self.map, next.phase(), next.position());
                writeln!(out, "next {dfen}")?;
                self.previous = Some(std::mem::replace(&mut self.turn, next));
            }
            (None, Some(GameOver::Solo(power))) => {
                writeln!(out, "gameover solo {}", self.map.power_name(power))?;
            }
            (None, Some(GameOver::YearLimit(year))) => {
                writeln!(out, "gameover year {year}")?;
            }
            (None, None) => writeln!(out, "gameover")?,
        }
        out.flush()?;
        Ok(())
    }

    fn write_result<W: Write>(&self, result: &TurnResult, out: &mut W) -> Result<(), EngineError> {
        let power = result.power.map(|p| self.map.power_name(p));
        if self.json {
            let view = ResultView {
                power,
                order: result.order.as_ref().map(|o| format_order(self.map, o)),
                result: &result.result,
                message: &result.message,
            };
            let line = serde_json::to_string(&view).map_err(io::Error::from)?;
            writeln!(out, "result {line}")?;
        } else {
            writeln!(
                out,
                "result {} {} {}",
                power.unwrap_or("-"),
                result_kind(&result.result),
                result.message
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ResultView<'a> {
    power: Option<&'a str>,
    order: Option<String>,
    result: &'a OrderResult,
    message: &'a str,
}

fn result_kind(result: &OrderResult) -> &'static str {
    match result {
        OrderResult::Succeeded => "succeeded",
        OrderResult::Failed => "failed",
        OrderResult::Bounced { .. } => "bounced",
        OrderResult::Cut { .. } => "cut",
        OrderResult::Dislodged { .. } => "dislodged",
        OrderResult::Substituted { .. } => "substituted",
        OrderResult::Invalid { .. } => "invalid",
        OrderResult::ConvoyPath { .. } => "convoy_path",
        OrderResult::Ignored => "ignored",
        OrderResult::Info => "info",
    }
}

fn opening_turn(map: &WorldMap) -> TurnState {
    let phase = Phase::new(map.start_year(), Season::Spring, PhaseKind::Movement);
    TurnState::new(phase, Position::opening(map))
}
