//! Route definitions.
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Game type listing
        .route("/api/v1/minigames/types", get(list_game_types))
        // Session lifecycle
        .route("/api/v1/minigames/start", post(start_game))
        .route(
            "/api/v1/minigames/sessions/:session_id/action",
            post(submit_action),
        )
        .route(
            "/api/v1/minigames/sessions/:session_id/end",
            post(end_game),
        )
        .route("/api/v1/minigames/sessions/:session_id", get(get_session))
        // Attach shared state
        .with_state(state)
}
