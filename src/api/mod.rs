mod error;
mod local;
mod logs;
mod rest;
mod types;
mod websocket;

pub use error::{ApiError, ApiResult};
pub use local::connect_local;
pub use logs::stream_logs;
pub use rest::{get_logs, health_check};
pub use types::*;
pub use websocket::websocket_handler;

use crate::eventlog::EventLog;
use crate::metrics::metrics_route;
use crate::relay::RoomManager;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomManager>,
    pub log: EventLog,
}

impl AppState {
    pub fn new(log: EventLog) -> Self {
        Self {
            rooms: Arc::new(RoomManager::new(log.clone())),
            log,
        }
    }
}

/// Relay WebSocket, administrative log, health and metrics on one router
pub fn create_api_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket_handler))
        .route("/admin/logs", get(get_logs))
        .route("/admin/logs/stream", get(stream_logs))
        .route("/metrics", metrics_route())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
