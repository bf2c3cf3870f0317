//! Error taxonomy. Validation errors are returned to the caller
//! unchanged; persistence errors never abort matching; `Internal` poisons
//! the affected symbol.

use crate::types::OrderId;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    /// Malformed input: non-positive quantity, missing/extra price for
    /// the order type, price or quantity off the symbol's tick/lot.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Cancel target does not exist.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// Cancel target is already filled or cancelled.
    #[error("order {0} is already terminal")]
    AlreadyTerminal(OrderId),

    /// FOK could not be filled in its entirety; accepted-but-cancelled,
    /// distinguishable from a user-initiated cancel.
    #[error("order rejected: fill-or-kill could not be satisfied")]
    Rejected,

    /// Invariant violation (crossed book, negative remaining). Fatal:
    /// the affected symbol is halted and requires operator intervention.
    #[error("internal invariant violation on symbol {0}: {1}")]
    Internal(String, String),

    /// The symbol has been halted following a prior `Internal` error.
    #[error("symbol {0} is halted after an internal invariant violation")]
    SymbolHalted(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
