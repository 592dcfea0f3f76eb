//! Command parser.
//!
//! Parses incoming protocol lines into `Command` variants that the engine
//! main loop dispatches on. Power names and orders are kept as text here;
//! the engine resolves them against the loaded variant.

use tracing::warn;

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Protocol handshake.
    Tribunal,

    /// Synchronization ping; the engine replies `readyok`.
    IsReady,

    /// Set a rule option: `setoption name <key> value <v>`.
    SetOption { name: String, value: Option<String> },

    /// Reset to the variant's opening position.
    NewGame,

    /// Set the board position from a DFEN string.
    Position { dfen: String },

    /// Submit orders for a power: `order <power> <dson> [; <dson> ...]`.
    Order { power: String, orders: String },

    /// Adjudicate the current turn and advance to the next.
    Adjudicate,

    /// Print the current position as DFEN.
    Show,

    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let first = *tokens.first()?;

    match first {
        "tribunal" => Some(Command::Tribunal),
        "isready" => Some(Command::IsReady),
        "quit" => Some(Command::Quit),
        "newgame" => Some(Command::NewGame),
        "adjudicate" => Some(Command::Adjudicate),
        "show" => Some(Command::Show),

        "setoption" => parse_setoption(&tokens),
        "position" => parse_position(&tokens),
        "order" => parse_order_command(&tokens),

        other => {
            warn!(command = other, "unknown command");
            None
        }
    }
}

/// Parses `setoption name <key> [value <v>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        warn!("malformed setoption: expected 'setoption name <key> [value <v>]'");
        return None;
    }

    let (name_parts, value_parts) = match tokens.iter().position(|&t| t == "value") {
        Some(vi) => (&tokens[2..vi], &tokens[vi + 1..]),
        None => (&tokens[2..], &tokens[tokens.len()..]),
    };
    if name_parts.is_empty() {
        warn!("malformed setoption: empty name");
        return None;
    }
    let value = (!value_parts.is_empty()).then(|| value_parts.join(" "));
    Some(Command::SetOption {
        name: name_parts.join(" "),
        value,
    })
}

/// Parses `position <dfen>`.
fn parse_position(tokens: &[&str]) -> Option<Command> {
    match tokens {
        [_, dfen] => Some(Command::Position {
            dfen: dfen.to_string(),
        }),
        _ => {
            warn!("malformed position: expected 'position <dfen>'");
            None
        }
    }
}

/// Parses `order <power> <dson...>`.
fn parse_order_command(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 {
        warn!("malformed order: expected 'order <power> <dson>'");
        return None;
    }
    Some(Command::Order {
        power: tokens[1].to_string(),
        orders: tokens[2..].join(" "),
    })
}
