//! Error types for the mini-game session engine.

use crate::games::types::GameType;
use crate::payments::PointsError;
use uuid::Uuid;

/// Errors surfaced by engine operations.
///
/// Validation failures (unsupported type, missing/inactive session, bad
/// action) map to client errors at the API boundary and never corrupt
/// engine state. `ProcessorMissing` is a deployment defect, not client
/// input: a game type registered in the catalog without an action
/// processor wired in.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unsupported game type: {0}")]
    UnsupportedGameType(String),

    #[error("game session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("game session {0} is not in progress")]
    SessionNotActive(Uuid),

    #[error("invalid action type for {game_type} game: {action_type}")]
    InvalidActionType {
        game_type: GameType,
        action_type: String,
    },

    #[error("invalid action data: {0}")]
    InvalidActionData(String),

    #[error("action processing not implemented for game type: {0}")]
    ProcessorMissing(GameType),

    /// The session terminated and a valid reward was computed, but the
    /// points sink failed the award call. The session is already gone;
    /// there is no rollback.
    #[error("failed to award {points} points to {player}: {source}")]
    AwardFailed {
        player: String,
        points: i64,
        #[source]
        source: PointsError,
    },
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
