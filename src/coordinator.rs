//! Process-wide coordinator: symbol registry, routing, and fan-out to
//! the trade publisher and persistence sink.
//!
//! One [`SymbolState`] per symbol, each behind its own `tokio::sync::Mutex`
//! inside a `DashMap<Symbol, Arc<Mutex<SymbolState>>>` so that submissions
//! against different symbols never contend with each other — only same-symbol
//! submissions serialize, matching the "logically single-threaded per
//! symbol, otherwise fully parallel." The mutex guard never crosses an
//! `.await`: persistence enqueue and trade publish are both synchronous,
//! non-blocking calls made after the guard is dropped.

use crate::error::{EngineError, EngineResult};
use crate::order_index::{IndexEntry, OrderIndex};
use crate::persistence::{PersistenceRecord, PersistenceSink};
use crate::trade_publisher::TradePublisher;
use crate::types::{Instrument, OrderId, OrderRequest, Symbol, SubmissionResult, UserId};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::engine::SymbolState;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Symbols are created lazily on first submission, using this instrument
/// as the default when none has been explicitly registered via
/// [`Coordinator::register_symbol`]: a permissive default config rather
/// than a hard startup failure for an unconfigured symbol.
#[derive(Clone, Copy, Debug)]
pub struct DefaultInstrument(pub Instrument);

impl Default for DefaultInstrument {
    fn default() -> Self {
        Self(Instrument::unconstrained())
    }
}

pub struct Coordinator {
    symbols: DashMap<Symbol, Arc<Mutex<SymbolState>>>,
    instruments: DashMap<Symbol, Instrument>,
    default_instrument: DefaultInstrument,
    order_index: OrderIndex,
    trades: TradePublisher,
    persistence: PersistenceSink,
    trade_sequence: AtomicU64,
}

impl Coordinator {
    /// Convenience constructor for tests and simple embedders: default
    /// trade channel capacity, unconstrained default instrument. The
    /// reference binary uses [`Coordinator::with_config`] instead, so
    /// the process's env-derived settings actually take effect.
    pub fn new(persistence: PersistenceSink) -> Self {
        Self {
            symbols: DashMap::new(),
            instruments: DashMap::new(),
            default_instrument: DefaultInstrument::default(),
            order_index: OrderIndex::new(),
            trades: TradePublisher::new(),
            persistence,
            trade_sequence: AtomicU64::new(0),
        }
    }

    /// Builds a coordinator from a loaded [`crate::config::Config`]:
    /// `trade_channel_capacity` sizes the broadcast channel and
    /// `default_instrument` is the tick/lot applied to a symbol seen for
    /// the first time with no explicit `SYMBOLS` entry. Per-symbol
    /// overrides are registered separately via `register_symbol`.
    pub fn with_config(persistence: PersistenceSink, config: &crate::config::Config) -> Self {
        Self {
            symbols: DashMap::new(),
            instruments: DashMap::new(),
            default_instrument: DefaultInstrument(config.default_instrument),
            order_index: OrderIndex::new(),
            trades: TradePublisher::with_capacity(config.trade_channel_capacity),
            persistence,
            trade_sequence: AtomicU64::new(0),
        }
    }

    /// Registers a symbol's tick/lot ahead of first use. Optional: a
    /// symbol first seen through `submit` gets `default_instrument`.
    pub fn register_symbol(&self, symbol: Symbol, instrument: Instrument) {
        self.instruments.insert(symbol, instrument);
    }

    pub fn subscribe_trades(&self) -> tokio::sync::broadcast::Receiver<crate::types::Trade> {
        self.trades.subscribe()
    }

    /// Liveness: the persistence sink's health, surfaced on `GET /health`
    /// per the propagation policy (a write failure never rejects an
    /// order, but it does degrade reported health).
    pub fn healthy(&self) -> bool {
        self.persistence.healthy()
    }

    fn symbol_handle(&self, symbol: &Symbol) -> Arc<Mutex<SymbolState>> {
        if let Some(existing) = self.symbols.get(symbol) {
            return existing.clone();
        }
        let instrument = self
            .instruments
            .get(symbol)
            .map(|i| *i)
            .unwrap_or(self.default_instrument.0);
        let handle = Arc::new(Mutex::new(SymbolState::new(symbol.clone(), instrument)));
        self.symbols.entry(symbol.clone()).or_insert(handle).clone()
    }

    fn next_trade_id(&self) -> crate::types::TradeId {
        self.trade_sequence.fetch_add(1, Ordering::Relaxed);
        crate::types::TradeId::new()
    }

    /// Runs one submission to completion. Assigns the order id
    /// and timestamp, routes to the owning symbol's worker, then — after
    /// releasing that symbol's lock — updates the process-wide index,
    /// publishes trades, and enqueues persistence records.
    pub async fn submit(&self, req: OrderRequest, user: UserId) -> EngineResult<SubmissionResult> {
        let order_id = OrderId::new();
        let symbol = req.symbol().clone();
        let timestamp = now_millis();

        self.persistence.enqueue(PersistenceRecord::OrderInsert {
            order_id,
            symbol: symbol.clone(),
            user: user.clone(),
            side: req.side(),
            order_type: req.kind(),
            quantity: req.quantity(),
            price: req.price(),
            timestamp,
            status: crate::types::OrderStatus::Open,
        });

        let handle = self.symbol_handle(&symbol);
        let outcome = {
            let mut state = handle.lock().await;
            state.submit(order_id, &req, &user, timestamp, || self.next_trade_id())
        };

        // Every rejection path — FOK infeasibility, a failed precondition,
        // or a halted symbol — leaves the `OrderInsert` record written
        // above as the only trace of this order_id unless we compensate
        // here. None of them ever touch the book, so the index and the
        // audit trail are both closed out as `cancelled`, exactly like a
        // user-initiated cancel of an order that never rested.
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.order_index.mark_terminal(order_id, symbol.clone());
                self.persistence.enqueue(PersistenceRecord::OrderStatusChange {
                    order_id,
                    status: crate::types::OrderStatus::Cancelled,
                    timestamp,
                });
                return Err(e);
            }
        };

        if let Some(rested) = &outcome.rested {
            self.order_index.mark_resting(rested.order_id, symbol.clone());
        } else {
            self.order_index.mark_terminal(order_id, symbol.clone());
        }

        self.persistence.enqueue(PersistenceRecord::OrderStatusChange {
            order_id,
            status: outcome.status,
            timestamp,
        });

        for trade in &outcome.trades {
            self.trades.publish(trade.clone());
            self.persistence.enqueue(PersistenceRecord::TradeRecord {
                trade_id: trade.trade_id,
                symbol: trade.symbol.clone(),
                price: trade.price,
                quantity: trade.quantity,
                maker_order_id: trade.maker_order_id,
                taker_order_id: trade.taker_order_id,
                aggressor_side: trade.aggressor_side,
                timestamp: trade.timestamp,
            });
            if outcome.fills.iter().any(|f| f.maker_order_id == trade.maker_order_id && f.maker_fully_filled) {
                self.order_index.mark_terminal(trade.maker_order_id, symbol.clone());
                self.persistence.enqueue(PersistenceRecord::OrderStatusChange {
                    order_id: trade.maker_order_id,
                    status: crate::types::OrderStatus::Filled,
                    timestamp,
                });
            }
        }

        Ok(SubmissionResult {
            order_id,
            trades: outcome.trades,
            status: outcome.status,
        })
    }

    /// Cancels a resting order by id alone (the cancel contract), using
    /// the process-wide index to find its symbol and to distinguish
    /// `NotFound` from `AlreadyTerminal` without touching any book.
    pub async fn cancel(&self, order_id: OrderId) -> EngineResult<()> {
        let symbol = match self.order_index.lookup(order_id) {
            None => return Err(EngineError::NotFound(order_id)),
            Some(IndexEntry::Terminal(_)) => return Err(EngineError::AlreadyTerminal(order_id)),
            Some(IndexEntry::Resting(symbol)) => symbol,
        };

        let handle = self.symbol_handle(&symbol);
        {
            let mut state = handle.lock().await;
            state.cancel(order_id)?;
        }

        self.order_index.mark_terminal(order_id, symbol.clone());
        self.persistence.enqueue(PersistenceRecord::OrderStatusChange {
            order_id,
            status: crate::types::OrderStatus::Cancelled,
            timestamp: now_millis(),
        });
        Ok(())
    }
}
