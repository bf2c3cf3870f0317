//! REST API integration tests. Spawn the server and call endpoints with reqwest.

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

#[tokio::test]
async fn health_returns_ok() {
    let (addr, _handle) = spawn_app().await;
    let url = format!("http://{}/health", addr);
    let client = reqwest::Client::new();
    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["ok"], serde_json::json!(true));
}

#[tokio::test]
async fn submit_order_accepts_limit_order_returns_200() {
    let (addr, _handle) = spawn_app().await;
    let url = format!("http://{}/orders", addr);
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&limit_order_json("sell", "100", "10"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], serde_json::json!("open"));
}

#[tokio::test]
async fn submit_order_then_cancel_returns_cancelled_true() {
    let (addr, _handle) = spawn_app().await;
    let url_orders = format!("http://{}/orders", addr);
    let url_cancel = format!("http://{}/orders/cancel", addr);
    let client = reqwest::Client::new();

    let submitted: serde_json::Value = client
        .post(&url_orders)
        .json(&limit_order_json("sell", "100", "5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = submitted["order_id"].clone();

    let response = client
        .post(&url_cancel)
        .json(&serde_json::json!({ "order_id": order_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], serde_json::json!("cancelled"));
    assert_eq!(json["order_id"], order_id);
}

#[tokio::test]
async fn cancel_nonexistent_order_returns_404() {
    let (addr, _handle) = spawn_app().await;
    let url = format!("http://{}/orders/cancel", addr);
    let client = reqwest::Client::new();
    let bogus = uuid::Uuid::new_v4().to_string();
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "order_id": bogus }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn submit_order_invalid_quantity_returns_400() {
    let (addr, _handle) = spawn_app().await;
    let url = format!("http://{}/orders", addr);
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&limit_order_json("buy", "100", "0"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let json: serde_json::Value = response.json().await.unwrap();
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn crossing_orders_return_trades() {
    let (addr, _handle) = spawn_app().await;
    let url = format!("http://{}/orders", addr);
    let client = reqwest::Client::new();
    let _ = client.post(&url).json(&limit_order_json("sell", "100", "5")).send().await.unwrap();
    let response = client.post(&url).json(&limit_order_json("buy", "100", "5")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["trades"].as_array().unwrap().len(), 1);
    assert_eq!(json["status"], serde_json::json!("filled"));
}
