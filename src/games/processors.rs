//! Per-game-type action processors.
//!
//! Each processor seeds a session's scratchpad at start and interprets
//! submitted actions against it. Dispatch is a closed registry keyed by
//! `GameType`: adding a game means one new impl plus one registry line.
//! Game types in the catalog without a registered processor (word
//! scramble, puzzle) fail fast on their first action.

use std::collections::HashMap;

use crate::errors::{EngineError, EngineResult};
use crate::games::types::{GameAction, GameConfig, GameData, GameState, GameStatus, GameType};
use crate::rng::RandomSource;

/// Interprets actions for one game type.
///
/// `apply` is called only with actions whose type tag matches
/// `expected_action`, with the session still in progress, and under the
/// session store's write lock.
pub trait ActionProcessor: Send + Sync {
    /// The single action type tag this processor accepts.
    fn expected_action(&self) -> &'static str;

    /// Builds the scratchpad a fresh session of this game type starts with.
    fn seed(&self, config: &GameConfig, rng: &dyn RandomSource) -> GameData;

    /// Applies one action, updating scratchpad and score. May transition
    /// the session to a terminal status (number guess completes itself on
    /// a correct guess); the lifecycle controller finalizes afterwards.
    fn apply(&self, state: &mut GameState, action: &GameAction) -> EngineResult<()>;
}

/// Click speed: every click is a point.
pub struct ClickSpeedProcessor;

impl ActionProcessor for ClickSpeedProcessor {
    fn expected_action(&self) -> &'static str {
        "click"
    }

    fn seed(&self, config: &GameConfig, _rng: &dyn RandomSource) -> GameData {
        let mut data = GameData::new();
        data.set_int("clicks", 0);
        data.set_int("maxClicks", config.max_score);
        data
    }

    fn apply(&self, state: &mut GameState, _action: &GameAction) -> EngineResult<()> {
        let clicks = state.game_data.increment("clicks");
        state.current_score = clicks;
        Ok(())
    }
}

/// Memory match: 10 points per successful match, every attempt counted.
pub struct MemoryMatchProcessor;

impl ActionProcessor for MemoryMatchProcessor {
    fn expected_action(&self) -> &'static str {
        "match_attempt"
    }

    fn seed(&self, _config: &GameConfig, _rng: &dyn RandomSource) -> GameData {
        let mut data = GameData::new();
        data.set_int("matches", 0);
        data.set_int("attempts", 0);
        // 4x4 grid
        data.set_int("gridSize", 4);
        data
    }

    fn apply(&self, state: &mut GameState, action: &GameAction) -> EngineResult<()> {
        state.game_data.increment("attempts");

        if action.bool_field("isMatch") == Some(true) {
            let matches = state.game_data.increment("matches");
            state.current_score = matches * 10;
        }

        Ok(())
    }
}

/// Number guess: the session ends itself on a correct guess, scoring
/// higher the fewer attempts were spent.
pub struct NumberGuessProcessor;

impl ActionProcessor for NumberGuessProcessor {
    fn expected_action(&self) -> &'static str {
        "guess"
    }

    fn seed(&self, _config: &GameConfig, rng: &dyn RandomSource) -> GameData {
        let mut data = GameData::new();
        data.set_int("targetNumber", rng.int_in_range(1, 100));
        data.set_int("attempts", 0);
        data.set_int("maxAttempts", 10);
        data
    }

    fn apply(&self, state: &mut GameState, action: &GameAction) -> EngineResult<()> {
        let guess = action.int_field("number").ok_or_else(|| {
            EngineError::InvalidActionData("guess requires a numeric \"number\" field".to_string())
        })?;

        let target = state.game_data.int("targetNumber").unwrap_or(0);
        let attempts = state.game_data.increment("attempts");

        if guess == target {
            let max_attempts = state.game_data.int("maxAttempts").unwrap_or(0);
            state.current_score = (max_attempts - attempts + 1) * 5;
            state.status = GameStatus::Completed;
        }

        Ok(())
    }
}

/// Registry of processors, keyed by game type.
pub struct ProcessorRegistry {
    processors: HashMap<GameType, Box<dyn ActionProcessor>>,
}

impl ProcessorRegistry {
    /// The standard registry. Word scramble and puzzle are catalog-only
    /// extension points and deliberately have no processor.
    pub fn standard() -> Self {
        let mut processors: HashMap<GameType, Box<dyn ActionProcessor>> = HashMap::new();
        processors.insert(GameType::ClickSpeed, Box::new(ClickSpeedProcessor));
        processors.insert(GameType::MemoryMatch, Box::new(MemoryMatchProcessor));
        processors.insert(GameType::NumberGuess, Box::new(NumberGuessProcessor));
        Self { processors }
    }

    pub fn get(&self, game_type: GameType) -> Option<&dyn ActionProcessor> {
        self.processors.get(&game_type).map(Box::as_ref)
    }
}
