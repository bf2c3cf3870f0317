//! Core data model: identifiers, symbols, sides, statuses, and the tagged
//! `OrderRequest` enum (charter data models).
//!
//! Order types are exhaustive variants per type (`Limit`/`Market`/`Ioc`/`Fok`)
//! rather than an orthogonal type+time-in-force pair, so an invalid
//! combination (e.g. a market order carrying a price) is not representable.

use rust_decimal::Decimal;
use std::fmt;

/// Exchange-assigned order identifier, rendered as `ORDER-<uuid>` at the
/// boundary (see persistence records).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OrderId(pub uuid::Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORDER-{}", self.0)
    }
}

/// Trade identifier, rendered as `TRADE-<uuid>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TradeId(pub uuid::Uuid);

impl TradeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRADE-{}", self.0)
    }
}

/// Symbol identifier: case-insensitive on input, canonicalized upper on
/// construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::new(s)
    }
}

/// Authenticated, opaque user principal attached to a submission (
/// the core receives this already-authenticated; it does not verify it).
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct UserId(pub String);

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order lifecycle status. `Filled` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Partial,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// Incoming order request: one tagged variant per supported order type
/// (replaces a runtime-typed dictionary with an
/// exhaustive match at the engine boundary).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderRequest {
    Limit {
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    },
    Market {
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
    },
    Ioc {
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    },
    Fok {
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    },
}

impl OrderRequest {
    pub fn symbol(&self) -> &Symbol {
        match self {
            OrderRequest::Limit { symbol, .. }
            | OrderRequest::Market { symbol, .. }
            | OrderRequest::Ioc { symbol, .. }
            | OrderRequest::Fok { symbol, .. } => symbol,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            OrderRequest::Limit { side, .. }
            | OrderRequest::Market { side, .. }
            | OrderRequest::Ioc { side, .. }
            | OrderRequest::Fok { side, .. } => *side,
        }
    }

    pub fn quantity(&self) -> Decimal {
        match self {
            OrderRequest::Limit { quantity, .. }
            | OrderRequest::Market { quantity, .. }
            | OrderRequest::Ioc { quantity, .. }
            | OrderRequest::Fok { quantity, .. } => *quantity,
        }
    }

    /// Limit price, if this variant carries one. `None` only for `Market`.
    pub fn price(&self) -> Option<Decimal> {
        match self {
            OrderRequest::Limit { price, .. }
            | OrderRequest::Ioc { price, .. }
            | OrderRequest::Fok { price, .. } => Some(*price),
            OrderRequest::Market { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OrderRequest::Limit { .. } => "limit",
            OrderRequest::Market { .. } => "market",
            OrderRequest::Ioc { .. } => "ioc",
            OrderRequest::Fok { .. } => "fok",
        }
    }
}

/// A resting order fragment on one side of one symbol's book. Invariant:
/// lives at exactly one [`crate::price_level::PriceLevel`] at a time, and
/// `remaining > 0` for as long as it rests.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Decimal,
    pub original_quantity: Decimal,
    pub remaining: Decimal,
    /// Monotonic within a price level; defines FIFO order.
    pub sequence: u64,
    pub user: UserId,
    pub timestamp: u64,
}

/// Immutable trade execution record.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub price: Decimal,
    pub quantity: Decimal,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub aggressor_side: Side,
    pub timestamp: u64,
}

/// Result of a successful `submit`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SubmissionResult {
    pub order_id: OrderId,
    pub trades: Vec<Trade>,
    pub status: OrderStatus,
}

/// Per-symbol tick/lot configuration. Rounding policy is a per-symbol
/// choice: the engine accepts a tick and lot and rejects non-conforming
/// orders as `InvalidOrder` rather than silently rounding them.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Instrument {
    pub tick: Decimal,
    pub lot: Decimal,
}

impl Instrument {
    pub fn new(tick: Decimal, lot: Decimal) -> Self {
        Self { tick, lot }
    }

    /// No tick/lot constraint beyond the decimal's own scale.
    pub fn unconstrained() -> Self {
        Self {
            tick: Decimal::new(1, 8),
            lot: Decimal::new(1, 8),
        }
    }

    pub fn conforms_price(&self, price: Decimal) -> bool {
        conforms_to_step(price, self.tick)
    }

    pub fn conforms_quantity(&self, quantity: Decimal) -> bool {
        conforms_to_step(quantity, self.lot)
    }
}

fn conforms_to_step(value: Decimal, step: Decimal) -> bool {
    if step <= Decimal::ZERO {
        return true;
    }
    (value / step).fract() == Decimal::ZERO
}
