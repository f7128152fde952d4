use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// Show commands.
pub mod game;
/// Health check.
pub mod health;
/// Status reads.
pub mod public;
/// SSE viewers.
pub mod sse;
/// WebSocket viewers.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(websocket::router())
        .merge(game::router())
        .merge(public::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
