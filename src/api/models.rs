//! Request/response models for the mini-game API.
//!
//! Wire format is camelCase, matching the mobile shell's expectations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::games::types::{GameConfig, GameData, GameResult, GameState, GameStatus, GameType};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub active_sessions: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    pub game_type: String,
    pub player: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameResponse {
    pub session_id: Uuid,
    pub game_type: GameType,
    /// Session duration in seconds.
    pub duration: u64,
    pub start_time: DateTime<Utc>,
    pub game_data: GameData,
    pub instructions: &'static str,
}

impl StartGameResponse {
    pub fn new(state: &GameState, config: &GameConfig) -> Self {
        Self {
            session_id: state.session_id,
            game_type: state.game_type,
            duration: config.duration.as_secs(),
            start_time: state.start_time,
            game_data: state.game_data.clone(),
            instructions: state.game_type.instructions(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GameActionRequest {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateResponse {
    pub session_id: Uuid,
    pub game_type: GameType,
    pub current_score: i64,
    pub status: GameStatus,
    pub game_data: GameData,
    /// Seconds remaining in the session window, clamped at zero.
    pub time_left: u64,
}

impl GameStateResponse {
    pub fn new(state: &GameState, config: &GameConfig) -> Self {
        let time_left = config
            .duration
            .saturating_sub(state.elapsed())
            .as_secs();
        Self {
            session_id: state.session_id,
            game_type: state.game_type,
            current_score: state.current_score,
            status: state.status,
            game_data: state.game_data.clone(),
            time_left: if state.status.is_terminal() { 0 } else { time_left },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndGameResponse {
    pub session_id: Uuid,
    pub final_score: i64,
    /// Session duration in seconds.
    pub duration: u64,
    pub points_earned: i64,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whether the score qualifies for the leaderboard (top 30% of the
    /// score ceiling).
    pub leaderboard: bool,
}

impl EndGameResponse {
    pub fn new(result: &GameResult, config: &GameConfig) -> Self {
        let leaderboard_threshold = (config.max_score as f64 * 0.7) as i64;
        Self {
            session_id: result.session_id,
            final_score: result.final_score,
            duration: result.duration.as_secs(),
            points_earned: result.points_earned,
            is_valid: result.is_valid,
            reason: result.reason.clone(),
            leaderboard: result.final_score >= leaderboard_threshold,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListGameTypesResponse {
    pub games: Vec<GameTypeInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTypeInfo {
    #[serde(rename = "type")]
    pub game_type: GameType,
    pub name: &'static str,
    pub description: &'static str,
    /// Session duration in seconds.
    pub duration: u64,
    pub max_score: i64,
    pub difficulty: u8,
    pub points_per_score: f64,
}

impl From<GameConfig> for GameTypeInfo {
    fn from(config: GameConfig) -> Self {
        Self {
            game_type: config.game_type,
            name: config.game_type.display_name(),
            description: config.game_type.description(),
            duration: config.duration.as_secs(),
            max_score: config.max_score,
            difficulty: config.difficulty,
            points_per_score: config.points_per_score,
        }
    }
}
