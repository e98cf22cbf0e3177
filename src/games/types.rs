//! Core domain types for mini-game sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::EngineError;

/// Supported mini-game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    ClickSpeed,
    MemoryMatch,
    NumberGuess,
    WordScramble,
    Puzzle,
}

impl GameType {
    /// Every game type the catalog knows about, in listing order.
    pub const ALL: [GameType; 5] = [
        GameType::ClickSpeed,
        GameType::MemoryMatch,
        GameType::NumberGuess,
        GameType::WordScramble,
        GameType::Puzzle,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            GameType::ClickSpeed => "Click Speed Challenge",
            GameType::MemoryMatch => "Memory Match",
            GameType::NumberGuess => "Number Guessing Game",
            GameType::WordScramble => "Word Scramble",
            GameType::Puzzle => "Puzzle Challenge",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameType::ClickSpeed => "Click as fast as you can within the time limit!",
            GameType::MemoryMatch => "Match pairs of cards by remembering their positions.",
            GameType::NumberGuess => "Guess the secret number with as few attempts as possible.",
            GameType::WordScramble => "Unscramble words to earn points.",
            GameType::Puzzle => "Solve challenging puzzles to earn maximum points.",
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            GameType::ClickSpeed => {
                "Click the button as many times as possible within 30 seconds. Each click gives you 1 point!"
            }
            GameType::MemoryMatch => {
                "Flip cards to find matching pairs. Remember their positions! Each match gives you 10 points."
            }
            GameType::NumberGuess => {
                "Guess the number between 1-100. Fewer attempts = more points!"
            }
            GameType::WordScramble => "Unscramble the given words. Faster solving = bonus points!",
            GameType::Puzzle => {
                "Solve the puzzle by arranging pieces correctly. Complexity = higher rewards!"
            }
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            GameType::ClickSpeed => "click_speed",
            GameType::MemoryMatch => "memory_match",
            GameType::NumberGuess => "number_guess",
            GameType::WordScramble => "word_scramble",
            GameType::Puzzle => "puzzle",
        };
        write!(f, "{}", tag)
    }
}

impl std::str::FromStr for GameType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click_speed" => Ok(GameType::ClickSpeed),
            "memory_match" => Ok(GameType::MemoryMatch),
            "number_guess" => Ok(GameType::NumberGuess),
            "word_scramble" => Ok(GameType::WordScramble),
            "puzzle" => Ok(GameType::Puzzle),
            other => Err(EngineError::UnsupportedGameType(other.to_string())),
        }
    }
}

/// Session status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Reserved for pre-start flows; never produced today.
    Waiting,
    InProgress,
    Completed,
    Abandoned,
}

impl GameStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Completed | GameStatus::Abandoned)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::InProgress => "in_progress",
            GameStatus::Completed => "completed",
            GameStatus::Abandoned => "abandoned",
        };
        write!(f, "{}", tag)
    }
}

/// Per-game-type configuration, immutable after catalog construction
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameConfig {
    pub game_type: GameType,
    /// Maximum wall-clock time a session may run.
    pub duration: Duration,
    /// Theoretical score ceiling.
    pub max_score: i64,
    /// Linear conversion rate: score -> points.
    pub points_per_score: f64,
    /// Inclusive anti-cheat acceptance band. Typically narrower than
    /// `[0, max_score]`.
    pub min_valid_score: i64,
    pub max_valid_score: i64,
    /// Difficulty level 1-5, feeds the reward multiplier.
    pub difficulty: u8,
}

impl GameConfig {
    /// Maps difficulty 1-5 onto a 1.0x-1.4x reward multiplier.
    pub fn difficulty_multiplier(&self) -> f64 {
        f64::from(self.difficulty) * 0.1 + 0.9
    }
}

/// Game-type-specific scratchpad carried by a session.
///
/// Keys are defined by convention per game type (e.g. `clicks`,
/// `targetNumber`), not by a shared schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameData(serde_json::Map<String, Value>);

impl GameData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.0.insert(key.to_string(), Value::from(value));
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Increments an integer entry, treating a missing key as 0.
    /// Returns the new value.
    pub fn increment(&mut self, key: &str) -> i64 {
        let next = self.int(key).unwrap_or(0) + 1;
        self.set_int(key, next);
        next
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single player input submitted against an active session.
/// Ephemeral: never retained beyond the processing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl GameAction {
    pub fn new(action_type: &str) -> Self {
        Self {
            action_type: action_type.to_string(),
            data: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(Value::as_bool)
    }

    /// Numeric payload field, truncated to an integer. JSON clients send
    /// plain numbers, so both `42` and `42.0` are accepted.
    pub fn int_field(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(Value::as_f64).map(|n| n as i64)
    }
}

/// The central mutable session entity, exclusively owned by the session
/// store for its live duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub session_id: Uuid,
    pub game_type: GameType,
    pub player: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub current_score: i64,
    pub game_data: GameData,
    pub status: GameStatus,
    pub last_activity: DateTime<Utc>,
}

impl GameState {
    pub fn new(game_type: GameType, player: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            game_type,
            player: player.into(),
            start_time: now,
            end_time: None,
            current_score: 0,
            game_data: GameData::new(),
            status: GameStatus::InProgress,
            last_activity: now,
        }
    }

    /// Wall-clock time since the session started.
    pub fn elapsed(&self) -> Duration {
        (Utc::now() - self.start_time).to_std().unwrap_or_default()
    }
}

/// Terminal snapshot derived from a session at end-of-session.
/// Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub session_id: Uuid,
    pub player: String,
    pub game_type: GameType,
    pub final_score: i64,
    pub duration: Duration,
    pub points_earned: i64,
    pub is_valid: bool,
    /// Populated only when the score was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_type_round_trip() {
        for game_type in GameType::ALL {
            let parsed: GameType = game_type.to_string().parse().unwrap();
            assert_eq!(parsed, game_type);
        }
    }

    #[test]
    fn test_unknown_game_type_rejected() {
        let err = "teleport".parse::<GameType>().unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedGameType(s) if s == "teleport"));
    }

    #[test]
    fn test_terminal_states() {
        assert!(GameStatus::Completed.is_terminal());
        assert!(GameStatus::Abandoned.is_terminal());
        assert!(!GameStatus::InProgress.is_terminal());
        assert!(!GameStatus::Waiting.is_terminal());
    }

    #[test]
    fn test_difficulty_multiplier_range() {
        let mut config = GameConfig {
            game_type: GameType::ClickSpeed,
            duration: Duration::from_secs(30),
            max_score: 200,
            points_per_score: 1.0,
            min_valid_score: 10,
            max_valid_score: 180,
            difficulty: 1,
        };
        assert!((config.difficulty_multiplier() - 1.0).abs() < 1e-9);
        config.difficulty = 5;
        assert!((config.difficulty_multiplier() - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_game_data_increment() {
        let mut data = GameData::new();
        assert_eq!(data.increment("clicks"), 1);
        assert_eq!(data.increment("clicks"), 2);
        assert_eq!(data.int("clicks"), Some(2));
        assert_eq!(data.int("missing"), None);
    }

    #[test]
    fn test_action_fields() {
        let action = GameAction::new("guess")
            .with_field("number", 42)
            .with_field("isMatch", true);
        assert_eq!(action.int_field("number"), Some(42));
        assert_eq!(action.bool_field("isMatch"), Some(true));
        assert_eq!(action.int_field("missing"), None);

        let fractional = GameAction::new("guess").with_field("number", 41.7);
        assert_eq!(fractional.int_field("number"), Some(41));
    }

    #[test]
    fn test_new_session_defaults() {
        let state = GameState::new(GameType::ClickSpeed, "alice");
        assert_eq!(state.status, GameStatus::InProgress);
        assert_eq!(state.current_score, 0);
        assert!(state.end_time.is_none());
        assert!(state.game_data.is_empty());
    }
}
