//! Price-time priority matching.
//!
//! [`match_order`] runs one order against a single symbol's book: the FOK
//! feasibility pre-check, the match loop (marketability, FIFO taking,
//! price improvement to the taker), and residual handling per order
//! type. Assumes the caller (`engine::SymbolState::submit`) has already
//! validated the order's preconditions — this function only implements
//! the matching algorithm itself.

use crate::error::{EngineError, EngineResult};
use crate::order_book::OrderBook;
use crate::types::{OrderRequest, OrderStatus, RestingOrder, Side, Trade, TradeId, UserId};
use rust_decimal::Decimal;

/// One resting order consumed by the match loop.
#[derive(Clone, Debug)]
pub struct MakerFill {
    pub maker_order_id: crate::types::OrderId,
    pub maker_user: UserId,
    pub price: Decimal,
    pub quantity: Decimal,
    pub maker_fully_filled: bool,
}

/// Everything `submit` needs after running the match loop: the trades to
/// publish/persist, per-maker fill detail (for `OrderIndex`/persistence
/// updates), the taker's final status, and the residual it rested (if
/// any).
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    pub trades: Vec<Trade>,
    pub fills: Vec<MakerFill>,
    pub status: OrderStatus,
    pub rested: Option<RestingOrder>,
}

fn marketable(taker_side: Side, price_limit: Option<Decimal>, level_price: Decimal) -> bool {
    match (taker_side, price_limit) {
        (_, None) => true,
        (Side::Buy, Some(limit)) => level_price <= limit,
        (Side::Sell, Some(limit)) => level_price >= limit,
    }
}

/// Runs one submission against `book`. `next_trade_id` mints a fresh
/// [`TradeId`] per fill, in match order.
pub fn match_order(
    book: &mut OrderBook,
    order_id: crate::types::OrderId,
    req: &OrderRequest,
    user: &UserId,
    timestamp: u64,
    sequence: u64,
    mut next_trade_id: impl FnMut() -> TradeId,
) -> EngineResult<MatchOutcome> {
    let symbol = req.symbol().clone();
    let taker_side = req.side();
    let quantity = req.quantity();
    let price_limit = req.price();

    // Step 2: FOK feasibility pre-check — reject before touching the book.
    if matches!(req, OrderRequest::Fok { .. }) {
        let available = book.available_opposite_qty(taker_side, price_limit);
        if available < quantity {
            return Err(EngineError::Rejected);
        }
    }

    // Step 3: match loop.
    let mut remaining = quantity;
    let mut trades = Vec::new();
    let mut fills = Vec::new();
    while remaining > Decimal::ZERO {
        let best_opposite_price = match taker_side {
            Side::Buy => book.best_ask().map(|(p, _)| p),
            Side::Sell => book.best_bid().map(|(p, _)| p),
        };
        let Some(price) = best_opposite_price else {
            break;
        };
        if !marketable(taker_side, price_limit, price) {
            break;
        }
        let Some(fill) = book.match_head(taker_side.opposite(), price, remaining) else {
            break;
        };
        if fill.quantity <= Decimal::ZERO {
            return Err(EngineError::Internal(
                symbol.to_string(),
                format!("matched a non-positive quantity {} against maker {}", fill.quantity, fill.maker_order_id),
            ));
        }
        remaining -= fill.quantity;
        if remaining < Decimal::ZERO {
            return Err(EngineError::Internal(
                symbol.to_string(),
                format!("remaining quantity went negative ({remaining}) during matching"),
            ));
        }

        trades.push(Trade {
            trade_id: next_trade_id(),
            symbol: symbol.clone(),
            price: fill.price,
            quantity: fill.quantity,
            maker_order_id: fill.maker_order_id,
            taker_order_id: order_id,
            aggressor_side: taker_side,
            timestamp,
        });
        fills.push(fill);
    }

    let filled_qty = quantity - remaining;

    // Step 4: residual handling, per order type.
    let (status, rested) = match req {
        OrderRequest::Limit { price, .. } => {
            if remaining <= Decimal::ZERO {
                (OrderStatus::Filled, None)
            } else {
                let status = if filled_qty > Decimal::ZERO {
                    OrderStatus::Partial
                } else {
                    OrderStatus::Open
                };
                let resting = RestingOrder {
                    order_id,
                    symbol: symbol.clone(),
                    side: taker_side,
                    price: *price,
                    original_quantity: quantity,
                    remaining,
                    sequence,
                    user: user.clone(),
                    timestamp,
                };
                book.insert_resting(resting.clone());
                (status, Some(resting))
            }
        }
        OrderRequest::Market { .. } | OrderRequest::Ioc { .. } => {
            let status = if remaining <= Decimal::ZERO {
                OrderStatus::Filled
            } else {
                OrderStatus::Cancelled
            };
            (status, None)
        }
        OrderRequest::Fok { .. } => {
            if remaining > Decimal::ZERO {
                return Err(EngineError::Internal(
                    symbol.to_string(),
                    format!("FOK left a remainder of {remaining} after passing the feasibility check"),
                ));
            }
            (OrderStatus::Filled, None)
        }
    };

    Ok(MatchOutcome {
        trades,
        fills,
        status,
        rested,
    })
}
