//! # xchange_core
//!
//! Multi-symbol, price-time-priority limit order book matching engine.
//!
//! ## Entry point
//!
//! [`coordinator::Coordinator`] is the process-wide entry point: it owns
//! one [`engine::SymbolState`] per symbol, the cross-symbol
//! [`order_index::OrderIndex`], the [`trade_publisher::TradePublisher`],
//! and a [`persistence::PersistenceSink`]. Submit and cancel orders
//! through it; it takes care of routing, trade fan-out, and the audit
//! trail.
//!
//! ## Example
//!
//! ```rust
//! use xchange_core::coordinator::Coordinator;
//! use xchange_core::persistence::{InMemoryWriter, PersistenceSink};
//! use xchange_core::types::{OrderRequest, Side, Symbol, UserId};
//! use rust_decimal::Decimal;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let coordinator = Coordinator::new(PersistenceSink::spawn(InMemoryWriter::new()));
//! let order = OrderRequest::Limit {
//!     symbol: Symbol::new("BTC-USD"),
//!     side: Side::Buy,
//!     quantity: Decimal::from(1),
//!     price: Decimal::from(100),
//! };
//! let result = coordinator.submit(order, UserId("alice".into())).await.unwrap();
//! assert!(result.trades.is_empty());
//! # }
//! ```
//!
//! ## Lower-level API
//!
//! [`order_book::OrderBook`] and [`matching::match_order`] are available
//! directly for single-symbol, single-threaded use without a
//! `Coordinator` (e.g. benches, the property test suite).

pub mod api;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod market_data_gen;
pub mod matching;
pub mod order_book;
pub mod order_index;
pub mod persistence;
pub mod price_level;
pub mod trade_publisher;
pub mod types;

pub use coordinator::Coordinator;
pub use engine::SymbolState;
pub use error::{EngineError, EngineResult};
pub use matching::match_order;
pub use order_book::OrderBook;
pub use auth::{AuthConfig, AuthUser, Role};
pub use types::{
    Instrument, OrderId, OrderRequest, OrderStatus, RestingOrder, Side, SubmissionResult, Symbol,
    Trade, TradeId, UserId,
};
pub use market_data_gen::{replay_into_coordinator, GeneratedOrder, Generator, GeneratorConfig};
