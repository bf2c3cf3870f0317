//! Non-blocking broadcast of trades to subscribers.
//!
//! One `tokio::sync::broadcast` channel per process. Trades for every
//! symbol share it (each [`crate::types::Trade`] carries its own
//! `symbol`; subscribers filter client-side) — broadcast preserves
//! global send order, a superset of the per-symbol ordering guarantee
//! the per-symbol ordering guarantee. Default policy is disconnect-on-overflow: a subscriber
//! that falls behind the channel's capacity receives
//! `RecvError::Lagged` on its next `recv`, the broadcast channel's
//! native way of not blocking the publisher for a slow reader.

use crate::types::Trade;
use tokio::sync::broadcast;

/// Default channel capacity. Overridable via [`TradePublisher::with_capacity`].
pub const DEFAULT_CAPACITY: usize = 4096;

#[derive(Clone, Debug)]
pub struct TradePublisher {
    sender: broadcast::Sender<Trade>,
}

impl TradePublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Registers a new subscriber. Receives trades emitted from this
    /// point forward, in emission order.
    pub fn subscribe(&self) -> broadcast::Receiver<Trade> {
        self.sender.subscribe()
    }

    /// Publishes a trade. Non-blocking: fans out to whatever receivers
    /// currently exist and returns immediately (`Sender::send` on a
    /// broadcast channel never awaits). Failure means there are no
    /// subscribers, which is not an error condition for the engine.
    pub fn publish(&self, trade: Trade) {
        let _ = self.sender.send(trade);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TradePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderId, Side, Symbol, TradeId};

    fn trade() -> Trade {
        Trade {
            trade_id: TradeId::new(),
            symbol: Symbol::new("BTC-USD"),
            price: rust_decimal::Decimal::from(100),
            quantity: rust_decimal::Decimal::from(1),
            maker_order_id: OrderId::new(),
            taker_order_id: OrderId::new(),
            aggressor_side: Side::Buy,
            timestamp: 1,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_trade() {
        let publisher = TradePublisher::new();
        let mut rx = publisher.subscribe();
        let t = trade();
        publisher.publish(t.clone());
        let received = rx.recv().await.unwrap();
        assert_eq!(received, t);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let publisher = TradePublisher::new();
        publisher.publish(trade());
    }

    #[tokio::test]
    async fn slow_subscriber_lags_rather_than_blocking_publisher() {
        let publisher = TradePublisher::with_capacity(2);
        let mut rx = publisher.subscribe();
        for _ in 0..5 {
            publisher.publish(trade());
        }
        let result = rx.recv().await;
        assert!(matches!(result, Err(broadcast::error::RecvError::Lagged(_))));
    }
}
