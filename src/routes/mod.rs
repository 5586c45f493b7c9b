//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The relay exposes a single websocket endpoint that peers connect to, plus
//! a liveness probe. There is no REST surface: every drawing mutation flows
//! through `/ws` as a Command.

pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
