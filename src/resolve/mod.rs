//! Order adjudication.
//!
//! Validates the orders of one turn, resolves them all at once with a
//! fixed-point computation over per-order state, handles circular
//! movement and convoy paradoxes, and produces the next turn.

pub mod adjudicator;
pub mod adjustment;
pub mod order_state;
mod orders;
mod paradox;
pub mod path;
pub mod phase;
pub mod result;
pub mod retreat;
pub mod turn;
pub mod validate;

pub use adjudicator::{adjudicate, Adjudication, AdjudicationError};
pub use adjustment::{civil_disorder, compute_adjustments, Adjustment};
pub use order_state::{DislodgedState, FailReason, OrderState, Tristate};
pub use paradox::SZYKMAN_ROUNDS;
pub use phase::{advance, next_phase, Advance, GameOver};
pub use result::{OrderResult, TurnResult};
pub use retreat::RetreatChecker;
pub use turn::TurnState;
pub use validate::{validate_order, OrderError, ValidationContext};
