//! WebSocket trade-stream integration tests: connect to `/trades/stream`
//! and assert published trades arrive in real time.

use futures_util::StreamExt;
use std::sync::Arc;
use xchange_core::api;
use xchange_core::auth::AuthConfig;
use xchange_core::coordinator::Coordinator;
use xchange_core::persistence::{InMemoryWriter, PersistenceSink};

async fn spawn_app() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let coordinator = Arc::new(Coordinator::new(PersistenceSink::spawn(InMemoryWriter::new())));
    let app = api::create_router(coordinator, AuthConfig::disabled());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    (addr, handle)
}

fn limit_order_json(side: &str, price: &str, quantity: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "limit",
        "symbol": "BTC-USD",
        "side": side,
        "quantity": quantity,
        "price": price,
    })
}

#[derive(serde::Deserialize)]
struct WireTrade {
    symbol: String,
    price: rust_decimal::Decimal,
    quantity: rust_decimal::Decimal,
}

#[tokio::test]
async fn subscriber_receives_trade_published_after_connect() {
    let (addr, _handle) = spawn_app().await;
    let ws_url = format!("ws://{}/trades/stream", addr);
    let (mut ws, _) = tokio_tungstenite::connect_async(&ws_url).await.expect("connect");

    // Give the server a moment to register the subscription before trading.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let order_url = format!("http://{}/orders", addr);
    let client = reqwest::Client::new();
    let _ = client.post(&order_url).json(&limit_order_json("sell", "100", "3")).send().await.unwrap();
    let _ = client.post(&order_url).json(&limit_order_json("buy", "100", "3")).send().await.unwrap();

    let raw = ws.next().await.expect("one message").expect("ws recv");
    let msg = raw.into_text().expect("text frame");
    let trade: WireTrade = serde_json::from_str(&msg).expect("json");
    assert_eq!(trade.symbol, "BTC-USD");
    assert_eq!(trade.price.to_string(), "100");
    assert_eq!(trade.quantity.to_string(), "3");
}
