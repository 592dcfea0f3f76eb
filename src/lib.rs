//! Tribunal, a Diplomacy turn adjudicator.
//!
//! Exposes the board representation, the adjudicator, rule options and
//! the protocol modules for use by integration tests and the binary
//! entry point.

pub mod board;
pub mod engine;
pub mod protocol;
pub mod resolve;
pub mod rules;
