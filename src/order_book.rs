//! Per-symbol order book: bids and asks, price-time priority.
//!
//! Two price-indexed ordered maps support O(log P) insert/remove of
//! levels and O(1) access to the extreme (best) level. Empty levels are
//! removed eagerly so a "best" query never returns a zero-qty level.

use crate::price_level::PriceLevel;
use crate::types::{OrderId, RestingOrder, Side, Symbol};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Location of a resting order within its book, for O(log P) cancellation.
#[derive(Clone, Copy, Debug)]
struct Location {
    side: Side,
    price: Decimal,
}

#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BTreeMap<Decimal, PriceLevel>,
    asks: BTreeMap<Decimal, PriceLevel>,
    index: HashMap<OrderId, Location>,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn levels(&self, side: Side) -> &BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Best bid: highest price with resting quantity.
    pub fn best_bid(&self) -> Option<(Decimal, &PriceLevel)> {
        self.bids.iter().next_back().map(|(p, l)| (*p, l))
    }

    /// Best ask: lowest price with resting quantity.
    pub fn best_ask(&self) -> Option<(Decimal, &PriceLevel)> {
        self.asks.iter().next().map(|(p, l)| (*p, l))
    }

    /// Inserts a resting order at its price, creating the level if
    /// absent, and records its location for cancellation.
    pub fn insert_resting(&mut self, order: RestingOrder) {
        let side = order.side;
        let price = order.price;
        let order_id = order.order_id;
        self.levels_mut(side).entry(price).or_default().push(order);
        self.index.insert(order_id, Location { side, price });
    }

    /// Removes a resting order by id. `Ok(removed)` on success; `Err(())`
    /// if unknown to this book (caller maps to `NotFound`/`AlreadyTerminal`
    /// using the process-wide `OrderIndex`).
    pub fn cancel(&mut self, order_id: OrderId) -> Option<RestingOrder> {
        let location = self.index.remove(&order_id)?;
        let levels = self.levels_mut(location.side);
        let level = levels.get_mut(&location.price)?;
        let removed = level.remove(order_id);
        if level.is_empty() {
            levels.remove(&location.price);
        }
        removed
    }

    /// Matches incoming liquidity against the head of `resting_side`'s
    /// level at `price`: decrements (or fully consumes) the head order,
    /// removes the level if it becomes empty, and drops the book's
    /// internal location entry for a fully-filled maker. Used internally
    /// by [`crate::matching::match_order`].
    pub(crate) fn match_head(
        &mut self,
        resting_side: Side,
        price: Decimal,
        incoming_qty: Decimal,
    ) -> Option<crate::matching::MakerFill> {
        let levels = self.levels_mut(resting_side);
        let level = levels.get_mut(&price)?;
        let (maker_order_id, maker_user, fill_qty, maker_fully_filled) = {
            let head = level.peek_mut()?;
            let fill_qty = incoming_qty.min(head.remaining);
            head.remaining -= fill_qty;
            (head.order_id, head.user.clone(), fill_qty, head.remaining <= Decimal::ZERO)
        };
        level.account_fill(fill_qty);
        if maker_fully_filled {
            level.pop_head();
        }
        if level.is_empty() {
            levels.remove(&price);
        }
        if maker_fully_filled {
            self.index.remove(&maker_order_id);
        }
        Some(crate::matching::MakerFill {
            maker_order_id,
            maker_user,
            price,
            quantity: fill_qty,
            maker_fully_filled,
        })
    }

    /// Total quantity marketable against `side`'s incoming order at or
    /// better than `price_limit` (the FOK feasibility pre-check). `None`
    /// limit means unconstrained (market FOK, rejected before reaching
    /// here, but kept general for completeness).
    pub fn available_opposite_qty(&self, incoming_side: Side, price_limit: Option<Decimal>) -> Decimal {
        let opposite = self.levels(incoming_side.opposite());
        let mut total = Decimal::ZERO;
        match incoming_side {
            Side::Buy => {
                for (price, level) in opposite.iter() {
                    if let Some(limit) = price_limit {
                        if *price > limit {
                            break;
                        }
                    }
                    total += level.total_qty();
                }
            }
            Side::Sell => {
                for (price, level) in opposite.iter().rev() {
                    if let Some(limit) = price_limit {
                        if *price < limit {
                            break;
                        }
                    }
                    total += level.total_qty();
                }
            }
        }
        total
    }

    pub fn has_resting_orders(&self) -> bool {
        !self.index.is_empty()
    }

    #[cfg(test)]
    pub fn depth(&self, side: Side) -> usize {
        self.levels(side).values().map(|l| l.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn resting(side: Side, price: i64, qty: i64, seq: u64) -> RestingOrder {
        RestingOrder {
            order_id: OrderId::new(),
            symbol: Symbol::new("BTC-USD"),
            side,
            price: Decimal::from(price),
            original_quantity: Decimal::from(qty),
            remaining: Decimal::from(qty),
            sequence: seq,
            user: UserId("trader".into()),
            timestamp: seq,
        }
    }

    #[test]
    fn insert_and_best_bid_ask() {
        let mut book = OrderBook::new(Symbol::new("BTC-USD"));
        book.insert_resting(resting(Side::Buy, 99, 5, 1));
        book.insert_resting(resting(Side::Sell, 101, 5, 2));
        assert_eq!(book.best_bid().unwrap().0, Decimal::from(99));
        assert_eq!(book.best_ask().unwrap().0, Decimal::from(101));
    }

    #[test]
    fn cancel_removes_order_and_empty_level() {
        let mut book = OrderBook::new(Symbol::new("BTC-USD"));
        let order = resting(Side::Buy, 99, 5, 1);
        let id = order.order_id;
        book.insert_resting(order);
        assert!(book.cancel(id).is_some());
        assert!(book.best_bid().is_none());
        assert!(book.cancel(id).is_none());
    }

    #[test]
    fn available_opposite_qty_respects_limit_and_side() {
        let mut book = OrderBook::new(Symbol::new("BTC-USD"));
        book.insert_resting(resting(Side::Sell, 100, 6, 1));
        book.insert_resting(resting(Side::Sell, 101, 5, 2));
        assert_eq!(
            book.available_opposite_qty(Side::Buy, Some(Decimal::from(100))),
            Decimal::from(6)
        );
        assert_eq!(
            book.available_opposite_qty(Side::Buy, Some(Decimal::from(101))),
            Decimal::from(11)
        );
    }

    #[test]
    fn eager_level_removal_keeps_best_query_nonzero() {
        let mut book = OrderBook::new(Symbol::new("BTC-USD"));
        let order = resting(Side::Sell, 100, 5, 1);
        let id = order.order_id;
        book.insert_resting(order);
        book.cancel(id);
        assert!(book.best_ask().is_none());
        assert_eq!(book.depth(Side::Sell), 0);
    }
}
