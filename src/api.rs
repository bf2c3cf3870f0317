//! REST + WebSocket surface for the matching engine (thin reference
//! binary). Not part of the core's boundary contract itself — an
//! illustrative adapter: `Extension`-based state so the router stays
//! `Router<()>` and works directly with `into_make_service()`, used by
//! both the binary and the integration tests.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension,
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::auth::{AuthConfig, AuthUser};
use crate::coordinator::Coordinator;
use crate::error::EngineError;
use crate::types::{OrderId, OrderRequest, UserId};

/// Shared app state: one coordinator per process.
#[derive(Clone)]
pub struct AppState {
    pub(crate) coordinator: Arc<Coordinator>,
}

/// Builds the REST + WebSocket router. Returns `Router<()>` so callers
/// can hand it straight to `axum::serve`.
pub fn create_router(coordinator: Arc<Coordinator>, auth: AuthConfig) -> Router<()> {
    let state = AppState { coordinator };
    Router::new()
        .route("/health", get(health))
        .route("/orders", post(submit_order))
        .route("/orders/cancel", post(cancel_order))
        .route("/trades/stream", get(trades_stream))
        .layer(middleware::from_fn(move |req, next| {
            let auth = auth.clone();
            async move { crate::auth::require_api_key_or_anonymous(req, next, auth).await }
        }))
        .layer(Extension(state))
}

async fn health(Extension(state): Extension<AppState>) -> impl IntoResponse {
    #[derive(serde::Serialize)]
    struct Health {
        ok: bool,
        persistence_healthy: bool,
    }
    let persistence_healthy = state.coordinator.healthy();
    let status = if persistence_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(Health { ok: true, persistence_healthy }))
}

#[derive(serde::Deserialize)]
struct CancelRequest {
    order_id: OrderId,
}

fn user_of(auth: &AuthUser) -> UserId {
    UserId(auth.key_id.clone().unwrap_or_else(|| "anonymous".to_string()))
}

fn error_response(err: EngineError) -> Response {
    let status = match err {
        EngineError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AlreadyTerminal(_) => StatusCode::CONFLICT,
        EngineError::Rejected => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::SymbolHalted(_) | EngineError::Internal(_, _) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

async fn submit_order(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<OrderRequest>,
) -> Response {
    match state.coordinator.submit(request, user_of(&auth)).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn cancel_order(
    Extension(state): Extension<AppState>,
    Json(body): Json<CancelRequest>,
) -> Response {
    match state.coordinator.cancel(body.order_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "order_id": body.order_id, "status": "cancelled" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn trades_stream(
    ws: WebSocketUpgrade,
    Extension(state): Extension<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| forward_trades(socket, state))
}

async fn forward_trades(mut socket: WebSocket, state: AppState) {
    let mut rx = state.coordinator.subscribe_trades();
    loop {
        match rx.recv().await {
            Ok(trade) => {
                let Ok(text) = serde_json::to_string(&trade) else { continue };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
