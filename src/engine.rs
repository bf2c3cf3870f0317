//! Per-symbol matching engine facade.
//!
//! [`SymbolState`] owns one [`OrderBook`] plus its id/sequence counters
//! and halt flag. It validates a submission's preconditions, then hands
//! off to [`crate::matching::match_order`] for the algorithm itself. A
//! `SymbolState` is only ever touched while its owning
//! [`crate::coordinator::Coordinator`] holds that symbol's lock, so it is
//! plain (not internally synchronized) — the "logically single-threaded
//! per symbol".

use crate::error::{EngineError, EngineResult};
use crate::matching::{match_order, MatchOutcome};
use crate::order_book::OrderBook;
use crate::types::{Instrument, OrderId, OrderRequest, Symbol, UserId};
use rust_decimal::Decimal;

#[derive(Debug)]
pub struct SymbolState {
    symbol: Symbol,
    book: OrderBook,
    instrument: Instrument,
    next_sequence: u64,
    /// Set once an `Internal` invariant violation is observed; once set,
    /// every further `submit`/`cancel` is rejected without touching the
    /// book (propagation policy).
    halted: bool,
}

impl SymbolState {
    pub fn new(symbol: Symbol, instrument: Instrument) -> Self {
        Self {
            book: OrderBook::new(symbol.clone()),
            symbol,
            instrument,
            next_sequence: 1,
            halted: false,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.book.best_bid().map(|(p, _)| p)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.book.best_ask().map(|(p, _)| p)
    }

    /// Preconditions: positive quantity, price present iff the
    /// order type requires one (enforced by `OrderRequest`'s shape), and
    /// price/quantity conforming to the symbol's tick/lot.
    fn validate(&self, req: &OrderRequest) -> EngineResult<()> {
        if req.quantity() <= Decimal::ZERO {
            return Err(EngineError::InvalidOrder("quantity must be positive".into()));
        }
        if let Some(price) = req.price() {
            if price <= Decimal::ZERO {
                return Err(EngineError::InvalidOrder("price must be positive".into()));
            }
            if !self.instrument.conforms_price(price) {
                return Err(EngineError::InvalidOrder(format!(
                    "price {} does not conform to tick size {}",
                    price, self.instrument.tick
                )));
            }
        }
        if !self.instrument.conforms_quantity(req.quantity()) {
            return Err(EngineError::InvalidOrder(format!(
                "quantity {} does not conform to lot size {}",
                req.quantity(),
                self.instrument.lot
            )));
        }
        Ok(())
    }

    /// Runs one submission to completion ("a submit runs to
    /// completion once dequeued; submissions are not cancellable
    /// mid-match").
    pub fn submit(
        &mut self,
        order_id: OrderId,
        req: &OrderRequest,
        user: &UserId,
        timestamp: u64,
        next_trade_id: impl FnMut() -> crate::types::TradeId,
    ) -> EngineResult<MatchOutcome> {
        if self.halted {
            return Err(EngineError::SymbolHalted(self.symbol.to_string()));
        }
        self.validate(req)?;

        let sequence = self.next_sequence;
        let outcome = match match_order(&mut self.book, order_id, req, user, timestamp, sequence, next_trade_id) {
            Ok(outcome) => outcome,
            Err(e @ EngineError::Internal(_, _)) => {
                self.halted = true;
                log::error!("symbol {} halted: {e}", self.symbol);
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.next_sequence += 1;

        if let Err(violation) = self.check_invariants() {
            self.halted = true;
            log::error!("symbol {} halted: {violation}", self.symbol);
            return Err(EngineError::Internal(self.symbol.to_string(), violation));
        }

        Ok(outcome)
    }

    /// Cancels a resting order local to this symbol. The caller
    /// (`Coordinator`) is responsible for distinguishing `NotFound` from
    /// `AlreadyTerminal` via the process-wide `OrderIndex` before
    /// routing here — by the time we get here the order is known to be
    /// resting on this symbol, so a miss here is an invariant violation.
    pub fn cancel(&mut self, order_id: OrderId) -> EngineResult<crate::types::RestingOrder> {
        if self.halted {
            return Err(EngineError::SymbolHalted(self.symbol.to_string()));
        }
        match self.book.cancel(order_id) {
            Some(removed) => Ok(removed),
            None => {
                self.halted = true;
                let msg = format!("OrderIndex pointed to resting order {order_id} not found in book");
                log::error!("symbol {} halted: {msg}", self.symbol);
                Err(EngineError::Internal(self.symbol.to_string(), msg))
            }
        }
    }

    /// No crossed book; every resting price level carries positive
    /// quantity. Checked after every mutation.
    fn check_invariants(&self) -> Result<(), String> {
        if let (Some((bid, _)), Some((ask, _))) = (self.book.best_bid(), self.book.best_ask()) {
            if bid >= ask {
                return Err(format!("crossed book: best_bid {bid} >= best_ask {ask}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Side, TradeId};

    fn req_limit(side: Side, price: i64, qty: i64) -> OrderRequest {
        OrderRequest::Limit {
            symbol: Symbol::new("BTC-USD"),
            side,
            quantity: Decimal::from(qty),
            price: Decimal::from(price),
        }
    }

    #[test]
    fn submit_rejects_non_positive_quantity() {
        let mut state = SymbolState::new(Symbol::new("BTC-USD"), Instrument::unconstrained());
        let req = OrderRequest::Market {
            symbol: Symbol::new("BTC-USD"),
            side: Side::Buy,
            quantity: Decimal::ZERO,
        };
        let err = state
            .submit(OrderId::new(), &req, &UserId("u".into()), 1, TradeId::new)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidOrder(_)));
    }

    #[test]
    fn submit_rejects_tick_violation() {
        let instrument = Instrument::new(Decimal::new(1, 0), Decimal::new(1, 0));
        let mut state = SymbolState::new(Symbol::new("BTC-USD"), instrument);
        let req = req_limit(Side::Buy, 100, 1);
        let mut bad = req.clone();
        if let OrderRequest::Limit { ref mut price, .. } = bad {
            *price = Decimal::new(1005, 1);
        }
        let err = state
            .submit(OrderId::new(), &bad, &UserId("u".into()), 1, TradeId::new)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidOrder(_)));
    }

    #[test]
    fn cancel_after_cancel_is_not_found_locally() {
        let mut state = SymbolState::new(Symbol::new("BTC-USD"), Instrument::unconstrained());
        let id = OrderId::new();
        let req = req_limit(Side::Buy, 99, 1);
        state.submit(id, &req, &UserId("u".into()), 1, TradeId::new).unwrap();
        state.cancel(id).unwrap();
        assert!(state.best_bid().is_none());
    }

    #[test]
    fn internal_error_from_match_loop_halts_the_symbol() {
        let mut state = SymbolState::new(Symbol::new("BTC-USD"), Instrument::unconstrained());
        let mut bad = crate::types::RestingOrder {
            order_id: OrderId::new(),
            symbol: Symbol::new("BTC-USD"),
            side: Side::Sell,
            price: Decimal::from(100),
            original_quantity: Decimal::from(5),
            remaining: Decimal::from(5),
            sequence: 1,
            user: UserId("maker".into()),
            timestamp: 1,
        };
        bad.remaining = Decimal::from(-5);
        state.book.insert_resting(bad);

        let buy = OrderRequest::Market {
            symbol: Symbol::new("BTC-USD"),
            side: Side::Buy,
            quantity: Decimal::from(1),
        };
        let err = state
            .submit(OrderId::new(), &buy, &UserId("taker".into()), 2, TradeId::new)
            .unwrap_err();
        assert!(matches!(err, EngineError::Internal(_, _)));
        assert!(state.is_halted());

        let next = state
            .submit(OrderId::new(), &req_limit(Side::Buy, 99, 1), &UserId("u".into()), 3, TradeId::new)
            .unwrap_err();
        assert!(matches!(next, EngineError::SymbolHalted(_)));
    }

    #[test]
    fn submit_then_cancel_restores_prior_state() {
        let mut state = SymbolState::new(Symbol::new("BTC-USD"), Instrument::unconstrained());
        assert!(state.best_bid().is_none());
        let id = OrderId::new();
        let req = req_limit(Side::Buy, 99, 1);
        state.submit(id, &req, &UserId("u".into()), 1, TradeId::new).unwrap();
        assert!(state.best_bid().is_some());
        state.cancel(id).unwrap();
        assert!(state.best_bid().is_none());
    }
}
