//! Request handlers for the mini-game API.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::engine::MiniGameEngine;
use crate::games::types::{GameAction, GameType};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state
pub struct AppState {
    pub engine: Arc<MiniGameEngine>,
    pub version: String,
}

/// Health check handler
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: state.version.clone(),
        active_sessions: state.engine.active_session_count(),
    })
}

/// List available game types with their configurations
/// GET /api/v1/minigames/types
pub async fn list_game_types(State(state): State<Arc<AppState>>) -> Json<ListGameTypesResponse> {
    let games = state
        .engine
        .list_game_types()
        .into_iter()
        .map(GameTypeInfo::from)
        .collect();
    Json(ListGameTypesResponse { games })
}

/// Start a new mini-game session
/// POST /api/v1/minigames/start
pub async fn start_game(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartGameRequest>,
) -> Result<Json<StartGameResponse>, ApiError> {
    let game_type: GameType = request
        .game_type
        .parse()
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    if request.player.trim().is_empty() {
        return Err(ApiError::bad_request(
            request_id.0,
            "player must not be empty".to_string(),
        ));
    }

    let session = state
        .engine
        .start_session(game_type, &request.player)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    let config = state.engine.config_for(game_type).ok_or_else(|| {
        ApiError::internal_error(
            request_id.0.clone(),
            format!("missing catalog entry for {}", game_type),
        )
    })?;

    Ok(Json(StartGameResponse::new(&session, &config)))
}

/// Submit an action against an active session
/// POST /api/v1/minigames/sessions/:session_id/action
pub async fn submit_action(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GameActionRequest>,
) -> Result<Json<GameStateResponse>, ApiError> {
    let action = GameAction {
        action_type: request.action_type,
        data: request.data,
        timestamp: Utc::now(),
    };

    let outcome = state
        .engine
        .process_action(session_id, action)
        .await
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    let config = state
        .engine
        .config_for(outcome.state.game_type)
        .ok_or_else(|| {
            ApiError::internal_error(
                request_id.0.clone(),
                format!("missing catalog entry for {}", outcome.state.game_type),
            )
        })?;

    Ok(Json(GameStateResponse::new(&outcome.state, &config)))
}

/// End an active session and settle its score
/// POST /api/v1/minigames/sessions/:session_id/end
pub async fn end_game(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<EndGameResponse>, ApiError> {
    let result = state
        .engine
        .end_session(session_id)
        .await
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    let config = state.engine.config_for(result.game_type).ok_or_else(|| {
        ApiError::internal_error(
            request_id.0.clone(),
            format!("missing catalog entry for {}", result.game_type),
        )
    })?;

    Ok(Json(EndGameResponse::new(&result, &config)))
}

/// Current snapshot of an active session
/// GET /api/v1/minigames/sessions/:session_id
pub async fn get_session(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GameStateResponse>, ApiError> {
    let session = state
        .engine
        .get_active_session(session_id)
        .map_err(|e| ApiError::from_engine(request_id.0.clone(), e))?;

    let config = state.engine.config_for(session.game_type).ok_or_else(|| {
        ApiError::internal_error(
            request_id.0.clone(),
            format!("missing catalog entry for {}", session.game_type),
        )
    })?;

    Ok(Json(GameStateResponse::new(&session, &config)))
}
