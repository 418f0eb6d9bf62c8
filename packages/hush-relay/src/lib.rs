//! Hush Relay Server
//!
//! A small WebSocket hub for end-to-end encrypted group chat:
//!
//! 1. **Session ids**: every accepted connection gets a fresh id and the
//!    list of everyone already online.
//!
//! 2. **Fan-out**: key announcements and sealed messages are relabelled with
//!    the sender's id and delivered to every other session.
//!
//! **Privacy**: The relay never sees plaintext or private keys. Sealed
//! messages are forwarded as opaque JSON. Nothing is stored: a restart
//! forgets every session.

pub mod handler;
pub mod protocol;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{RelayConfig, SessionRegistry};

/// Router state: one registry per hub.
#[derive(Clone)]
pub struct RelayState {
    pub registry: SessionRegistry,
    pub config: Arc<RelayConfig>,
}

/// Build the relay's HTTP router around an existing registry.
pub fn router(registry: SessionRegistry, config: RelayConfig) -> Router {
    let state = RelayState {
        registry,
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Route Handlers ────────────────────────────────────────────────────────────

/// WebSocket upgrade handler for participant connections.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> impl IntoResponse {
    let max = state.config.max_message_bytes;
    ws.max_message_size(max)
        .max_frame_size(max)
        .on_upgrade(move |socket| handler::handle_websocket(socket, state.registry))
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "hush-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Statistics endpoint.
async fn stats_handler(State(state): State<RelayState>) -> impl IntoResponse {
    Json(json!({
        "online_clients": state.registry.online_count(),
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
