//! Process-wide `order_id -> symbol` index.
//!
//! Sharded via [`dashmap::DashMap`] so a bare `cancel(order_id)` can be
//! routed to the right per-symbol worker without taking a lock shared
//! with matching ("a global index must be sharded or guarded to
//! avoid contention with matching"). Holds a weak reference only —
//! updated transactionally with the owning `OrderBook` by whichever
//! symbol worker currently holds that book's lock.

use crate::types::{OrderId, Symbol};
use dashmap::DashMap;

/// Where an order id currently points: resting in a book, or terminal
/// (filled/cancelled) and retained only so a second cancel reports
/// `AlreadyTerminal` instead of `NotFound`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexEntry {
    Resting(Symbol),
    Terminal(Symbol),
}

#[derive(Debug, Default)]
pub struct OrderIndex {
    map: DashMap<OrderId, IndexEntry>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    pub fn lookup(&self, order_id: OrderId) -> Option<IndexEntry> {
        self.map.get(&order_id).map(|e| e.clone())
    }

    pub fn mark_resting(&self, order_id: OrderId, symbol: Symbol) {
        self.map.insert(order_id, IndexEntry::Resting(symbol));
    }

    pub fn mark_terminal(&self, order_id: OrderId, symbol: Symbol) {
        self.map.insert(order_id, IndexEntry::Terminal(symbol));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.map.len()
    }
}
