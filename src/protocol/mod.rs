//! Text protocol handling.
//!
//! Parsing and serialization for the engine's line protocol: DFEN position
//! encoding, DSON order notation, and the command parser for the main loop.
//! All of it works against a loaded variant map.

pub mod dfen;
pub mod dson;
pub mod parser;

pub use dfen::{encode_dfen, parse_dfen, DfenError};
pub use dson::{format_order, format_orders, parse_order, parse_orders, DsonError};
pub use parser::{parse_command, Command};
