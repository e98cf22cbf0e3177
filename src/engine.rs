//! Session lifecycle controller and reward calculator.
//!
//! The engine owns the catalog, the session store, the processor
//! registry, and the injected points/randomness capabilities. It is an
//! explicit, constructible object with its own shutdown path, so tests
//! can run isolated instances side by side.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::games::catalog::GameCatalog;
use crate::games::processors::ProcessorRegistry;
use crate::games::store::SessionStore;
use crate::games::types::{GameAction, GameConfig, GameResult, GameState, GameStatus, GameType};
use crate::payments::PointsSink;
use crate::reaper::AbandonmentReaper;
use crate::rng::{RandomSource, StdRandomSource};

/// Result of one `process_action` call.
///
/// `result` is populated when the call terminated the session (the
/// timeout check fired, or the processor transitioned the session to a
/// terminal status), in which case the same settle path as a manual
/// `end_session` has already run.
#[derive(Debug)]
pub struct ActionOutcome {
    pub state: GameState,
    pub result: Option<GameResult>,
}

/// Manages all live mini-game sessions for one process.
pub struct MiniGameEngine {
    catalog: GameCatalog,
    store: SessionStore,
    processors: ProcessorRegistry,
    points: Arc<dyn PointsSink>,
    rng: Arc<dyn RandomSource>,
    reaper: Mutex<Option<Arc<AbandonmentReaper>>>,
}

impl MiniGameEngine {
    pub fn new(
        catalog: GameCatalog,
        points: Arc<dyn PointsSink>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            catalog,
            store: SessionStore::new(),
            processors: ProcessorRegistry::standard(),
            points,
            rng,
            reaper: Mutex::new(None),
        }
    }

    /// Engine with the default catalog and production randomness.
    pub fn with_defaults(points: Arc<dyn PointsSink>) -> Self {
        Self::new(GameCatalog::with_defaults(), points, Arc::new(StdRandomSource))
    }

    /// Starts the background abandonment reaper. Idempotent per engine:
    /// a previous reaper is stopped before the new one is installed.
    pub fn start_reaper(&self, sweep_interval: Duration, grace: Duration) {
        let reaper = AbandonmentReaper::spawn(self.store.clone(), sweep_interval, grace);
        if let Some(previous) = self
            .reaper
            .lock()
            .expect("reaper handle lock poisoned")
            .replace(reaper)
        {
            previous.stop();
        }
    }

    /// Stops the reaper task cleanly. Live sessions are left in place.
    pub fn shutdown(&self) {
        if let Some(reaper) = self
            .reaper
            .lock()
            .expect("reaper handle lock poisoned")
            .take()
        {
            reaper.stop();
        }
    }

    /// Creates a new session for the given game type and player.
    pub fn start_session(&self, game_type: GameType, player: &str) -> EngineResult<GameState> {
        let config = self
            .catalog
            .config_for(game_type)
            .ok_or_else(|| EngineError::UnsupportedGameType(game_type.to_string()))?;

        let mut state = GameState::new(game_type, player);
        if let Some(processor) = self.processors.get(game_type) {
            state.game_data = processor.seed(&config, self.rng.as_ref());
        }

        tracing::info!(
            session_id = %state.session_id,
            game_type = %game_type,
            player,
            "game session started"
        );

        self.store.insert(state.clone());
        Ok(state)
    }

    /// Applies one action to an active session.
    ///
    /// The timeout check runs before dispatch: a session past its
    /// configured duration is terminated and the submitted action is
    /// discarded. After dispatch, a processor-driven transition to a
    /// terminal status triggers the same finalize path as an explicit
    /// `end_session`.
    pub async fn process_action(
        &self,
        session_id: Uuid,
        action: GameAction,
    ) -> EngineResult<ActionOutcome> {
        let (state, finished) = {
            let mut sessions = self.store.write();
            let session = sessions
                .get_mut(&session_id)
                .ok_or(EngineError::SessionNotFound(session_id))?;

            if session.status != GameStatus::InProgress {
                return Err(EngineError::SessionNotActive(session_id));
            }

            session.last_activity = Utc::now();

            let config = self
                .catalog
                .config_for(session.game_type)
                .ok_or_else(|| EngineError::UnsupportedGameType(session.game_type.to_string()))?;

            if session.elapsed() > config.duration {
                let mut state = sessions
                    .remove(&session_id)
                    .expect("session present under write lock");
                state.status = GameStatus::Completed;
                state.end_time = Some(Utc::now());
                tracing::info!(%session_id, score = state.current_score, "session timed out");
                (state, true)
            } else {
                let processor = self
                    .processors
                    .get(session.game_type)
                    .ok_or(EngineError::ProcessorMissing(session.game_type))?;

                if action.action_type != processor.expected_action() {
                    return Err(EngineError::InvalidActionType {
                        game_type: session.game_type,
                        action_type: action.action_type.clone(),
                    });
                }

                processor.apply(session, &action)?;

                if session.status.is_terminal() {
                    let mut state = sessions
                        .remove(&session_id)
                        .expect("session present under write lock");
                    state.end_time = Some(Utc::now());
                    tracing::info!(
                        %session_id,
                        score = state.current_score,
                        "session completed by action processor"
                    );
                    (state, true)
                } else {
                    (session.clone(), false)
                }
            }
        };

        // Settlement runs outside the store lock.
        if finished {
            let result = self.settle(&state).await?;
            Ok(ActionOutcome {
                state,
                result: Some(result),
            })
        } else {
            Ok(ActionOutcome {
                state,
                result: None,
            })
        }
    }

    /// Explicitly ends an active session and settles its score.
    pub async fn end_session(&self, session_id: Uuid) -> EngineResult<GameResult> {
        let mut state = self
            .store
            .remove(&session_id)
            .ok_or(EngineError::SessionNotFound(session_id))?;
        state.status = GameStatus::Completed;
        state.end_time = Some(Utc::now());

        tracing::info!(%session_id, score = state.current_score, "session ended");
        self.settle(&state).await
    }

    /// Read-only snapshot of a live session. Terminated sessions are
    /// removed from the store, not retained.
    pub fn get_active_session(&self, session_id: Uuid) -> EngineResult<GameState> {
        self.store
            .get(&session_id)
            .ok_or(EngineError::SessionNotFound(session_id))
    }

    /// All game configurations, as copies.
    pub fn list_game_types(&self) -> Vec<GameConfig> {
        self.catalog.all()
    }

    pub fn config_for(&self, game_type: GameType) -> Option<GameConfig> {
        self.catalog.config_for(game_type)
    }

    pub fn active_session_count(&self) -> usize {
        self.store.active_count()
    }

    /// Validates a final score against the anti-cheat band and converts
    /// it into points. Pure: no session state is touched.
    ///
    /// An out-of-band score is not an error: it yields a structured
    /// `is_valid = false` result with zero points and a reason.
    pub fn calculate_reward(&self, mut result: GameResult) -> EngineResult<GameResult> {
        let config = self
            .catalog
            .config_for(result.game_type)
            .ok_or_else(|| EngineError::UnsupportedGameType(result.game_type.to_string()))?;

        if result.final_score < config.min_valid_score
            || result.final_score > config.max_valid_score
        {
            result.is_valid = false;
            result.points_earned = 0;
            result.reason = Some(format!(
                "score {} is outside valid range [{}, {}]",
                result.final_score, config.min_valid_score, config.max_valid_score
            ));
            return Ok(result);
        }

        let base_points = result.final_score as f64 * config.points_per_score;
        result.points_earned = (base_points * config.difficulty_multiplier()).floor() as i64;
        result.is_valid = true;
        result.reason = None;
        Ok(result)
    }

    /// Derives the terminal result for a removed session, validates it,
    /// and routes a valid reward to the points sink.
    async fn settle(&self, state: &GameState) -> EngineResult<GameResult> {
        let end_time = state.end_time.unwrap_or_else(Utc::now);
        let duration = (end_time - state.start_time).to_std().unwrap_or_default();

        let result = self.calculate_reward(GameResult {
            session_id: state.session_id,
            player: state.player.clone(),
            game_type: state.game_type,
            final_score: state.current_score,
            duration,
            points_earned: 0,
            is_valid: false,
            reason: None,
        })?;

        if result.is_valid && result.points_earned > 0 {
            let description = format!("{} game - Score: {}", result.game_type, result.final_score);
            match self
                .points
                .add_points(&result.player, result.points_earned, &description)
                .await
            {
                Ok(receipt) => {
                    tracing::info!(
                        session_id = %result.session_id,
                        player = %result.player,
                        points = result.points_earned,
                        transaction_id = %receipt.transaction_id,
                        "points awarded"
                    );
                }
                Err(source) => {
                    // The session is already gone; the player earned
                    // points they may not have received.
                    tracing::error!(
                        session_id = %result.session_id,
                        player = %result.player,
                        points = result.points_earned,
                        error = %source,
                        "points award failed after session completion"
                    );
                    return Err(EngineError::AwardFailed {
                        player: result.player.clone(),
                        points: result.points_earned,
                        source,
                    });
                }
            }
        } else if !result.is_valid {
            tracing::warn!(
                session_id = %result.session_id,
                player = %result.player,
                score = result.final_score,
                reason = result.reason.as_deref().unwrap_or(""),
                "final score rejected"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{PointsError, PointsReceipt};
    use crate::rng::FixedRandomSource;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Sink that records calls and optionally fails them.
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(String, i64, String)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn calls(&self) -> Vec<(String, i64, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PointsSink for RecordingSink {
        async fn add_points(
            &self,
            player: &str,
            amount: i64,
            description: &str,
        ) -> Result<PointsReceipt, PointsError> {
            if self.fail {
                return Err(PointsError::Unavailable("sink offline".to_string()));
            }
            self.calls.lock().unwrap().push((
                player.to_string(),
                amount,
                description.to_string(),
            ));
            Ok(PointsReceipt {
                transaction_id: Uuid::new_v4(),
                player: player.to_string(),
                amount,
                description: description.to_string(),
                created_at: Utc::now(),
            })
        }
    }

    fn engine_with(sink: Arc<RecordingSink>, targets: Vec<i64>) -> MiniGameEngine {
        MiniGameEngine::new(
            GameCatalog::with_defaults(),
            sink,
            Arc::new(FixedRandomSource::new(targets)),
        )
    }

    fn zero_duration_catalog(game_type: GameType) -> GameCatalog {
        let mut config = GameCatalog::with_defaults().config_for(game_type).unwrap();
        config.duration = Duration::ZERO;
        GameCatalog::with_defaults().with_config(config)
    }

    #[tokio::test]
    async fn test_start_session_initial_state() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![]);

        let state = engine.start_session(GameType::ClickSpeed, "alice").unwrap();
        assert_eq!(state.status, GameStatus::InProgress);
        assert_eq!(state.current_score, 0);
        assert_eq!(state.player, "alice");
        assert!(state.end_time.is_none());
        assert_eq!(state.game_data.int("clicks"), Some(0));
        assert_eq!(state.game_data.int("maxClicks"), Some(200));
        assert_eq!(engine.active_session_count(), 1);
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![]);
        let ids: HashSet<Uuid> = (0..50)
            .map(|_| {
                engine
                    .start_session(GameType::ClickSpeed, "alice")
                    .unwrap()
                    .session_id
            })
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn test_start_session_unknown_catalog_entry() {
        let engine = MiniGameEngine::new(
            GameCatalog::empty(),
            Arc::new(RecordingSink::default()),
            Arc::new(StdRandomSource),
        );
        let err = engine
            .start_session(GameType::ClickSpeed, "alice")
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedGameType(_)));
    }

    #[tokio::test]
    async fn test_number_guess_seeds_target_from_rng() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![42]);
        let state = engine.start_session(GameType::NumberGuess, "bob").unwrap();
        assert_eq!(state.game_data.int("targetNumber"), Some(42));
        assert_eq!(state.game_data.int("attempts"), Some(0));
        assert_eq!(state.game_data.int("maxAttempts"), Some(10));
    }

    #[tokio::test]
    async fn test_click_actions_accumulate_score() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![]);
        let session_id = engine
            .start_session(GameType::ClickSpeed, "alice")
            .unwrap()
            .session_id;

        for expected in 1..=7 {
            let outcome = engine
                .process_action(session_id, GameAction::new("click"))
                .await
                .unwrap();
            assert_eq!(outcome.state.current_score, expected);
            assert!(outcome.result.is_none());
        }
    }

    #[tokio::test]
    async fn test_wrong_action_type_leaves_session_unchanged() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![]);
        let session_id = engine
            .start_session(GameType::ClickSpeed, "alice")
            .unwrap()
            .session_id;

        engine
            .process_action(session_id, GameAction::new("click"))
            .await
            .unwrap();

        let err = engine
            .process_action(session_id, GameAction::new("guess"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidActionType { action_type, .. } if action_type == "guess"
        ));

        let state = engine.get_active_session(session_id).unwrap();
        assert_eq!(state.current_score, 1);
        assert_eq!(state.status, GameStatus::InProgress);
    }

    #[tokio::test]
    async fn test_unimplemented_game_type_fails_fast() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![]);
        let state = engine
            .start_session(GameType::WordScramble, "alice")
            .unwrap();
        assert!(state.game_data.is_empty());

        let err = engine
            .process_action(state.session_id, GameAction::new("solve"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ProcessorMissing(GameType::WordScramble)
        ));
    }

    #[tokio::test]
    async fn test_end_session_click_speed_scenario() {
        // 45 clicks within the window: base 45 * 1.0, difficulty 2 gives
        // the 1.1x multiplier, floor(49.5) = 49.
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(sink.clone(), vec![]);
        let session_id = engine
            .start_session(GameType::ClickSpeed, "alice")
            .unwrap()
            .session_id;

        for _ in 0..45 {
            engine
                .process_action(session_id, GameAction::new("click"))
                .await
                .unwrap();
        }

        let result = engine.end_session(session_id).await.unwrap();
        assert_eq!(result.final_score, 45);
        assert!(result.is_valid);
        assert_eq!(result.points_earned, 49);
        assert!(result.reason.is_none());

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            (
                "alice".to_string(),
                49,
                "click_speed game - Score: 45".to_string()
            )
        );
        assert_eq!(engine.active_session_count(), 0);
    }

    #[tokio::test]
    async fn test_number_guess_self_termination_settles() {
        // Correct on attempt 3 of 10: score (10-3+1)*5 = 40, then
        // floor(40 * 3.0 * 1.1) = 132 points, all without an explicit
        // end_session call.
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(sink.clone(), vec![42]);
        let session_id = engine
            .start_session(GameType::NumberGuess, "bob")
            .unwrap()
            .session_id;

        for wrong in [10, 20] {
            let outcome = engine
                .process_action(
                    session_id,
                    GameAction::new("guess").with_field("number", wrong),
                )
                .await
                .unwrap();
            assert!(outcome.result.is_none());
        }

        let outcome = engine
            .process_action(
                session_id,
                GameAction::new("guess").with_field("number", 42),
            )
            .await
            .unwrap();

        assert_eq!(outcome.state.status, GameStatus::Completed);
        assert_eq!(outcome.state.current_score, 40);
        let result = outcome.result.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.points_earned, 132);

        // The session is gone: no second settle, no double award.
        let err = engine.end_session(session_id).await.unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(_)));
        assert_eq!(sink.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_discards_action_and_settles() {
        let sink = Arc::new(RecordingSink::default());
        let engine = MiniGameEngine::new(
            zero_duration_catalog(GameType::ClickSpeed),
            sink.clone(),
            Arc::new(StdRandomSource),
        );
        let session_id = engine
            .start_session(GameType::ClickSpeed, "alice")
            .unwrap()
            .session_id;

        let outcome = engine
            .process_action(session_id, GameAction::new("click"))
            .await
            .unwrap();

        // Timeout precedes dispatch: the click never lands.
        assert_eq!(outcome.state.status, GameStatus::Completed);
        assert_eq!(outcome.state.current_score, 0);
        let result = outcome.result.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.points_earned, 0);
        assert!(result.reason.as_deref().unwrap().contains("outside valid range"));

        // Score 0 is below the band: nothing was awarded.
        assert!(sink.calls().is_empty());
        assert!(engine.get_active_session(session_id).is_err());
    }

    #[tokio::test]
    async fn test_double_end_fails_without_double_award() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(sink.clone(), vec![]);
        let session_id = engine
            .start_session(GameType::ClickSpeed, "alice")
            .unwrap()
            .session_id;
        for _ in 0..20 {
            engine
                .process_action(session_id, GameAction::new("click"))
                .await
                .unwrap();
        }

        engine.end_session(session_id).await.unwrap();
        let err = engine.end_session(session_id).await.unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(_)));
        assert_eq!(sink.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_actions_rejected_after_end() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![]);
        let session_id = engine
            .start_session(GameType::MemoryMatch, "carol")
            .unwrap()
            .session_id;

        engine.end_session(session_id).await.unwrap();

        let err = engine
            .process_action(
                session_id,
                GameAction::new("match_attempt").with_field("isMatch", true),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(_)));

        let err = engine.get_active_session(session_id).unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_reward_validity_band_is_inclusive() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![]);
        let template = GameResult {
            session_id: Uuid::new_v4(),
            player: "alice".to_string(),
            game_type: GameType::ClickSpeed,
            final_score: 0,
            duration: Duration::from_secs(30),
            points_earned: 0,
            is_valid: false,
            reason: None,
        };

        // Band for click_speed is [10, 180].
        for (score, valid) in [(9, false), (10, true), (180, true), (181, false)] {
            let result = engine
                .calculate_reward(GameResult {
                    final_score: score,
                    ..template.clone()
                })
                .unwrap();
            assert_eq!(result.is_valid, valid, "score {}", score);
            if valid {
                let expected = ((score as f64) * 1.0 * 1.1).floor() as i64;
                assert_eq!(result.points_earned, expected);
            } else {
                assert_eq!(result.points_earned, 0);
                let reason = result.reason.unwrap();
                assert!(reason.contains(&score.to_string()));
                assert!(reason.contains("[10, 180]"));
            }
        }
    }

    #[tokio::test]
    async fn test_award_failure_surfaces_after_termination() {
        let sink = Arc::new(RecordingSink::failing());
        let engine = engine_with(sink, vec![]);
        let session_id = engine
            .start_session(GameType::ClickSpeed, "alice")
            .unwrap()
            .session_id;
        for _ in 0..45 {
            engine
                .process_action(session_id, GameAction::new("click"))
                .await
                .unwrap();
        }

        let err = engine.end_session(session_id).await.unwrap_err();
        match err {
            EngineError::AwardFailed { player, points, .. } => {
                assert_eq!(player, "alice");
                assert_eq!(points, 49);
            }
            other => panic!("expected AwardFailed, got {:?}", other),
        }

        // No rollback: the session stays terminated.
        assert!(engine.get_active_session(session_id).is_err());
    }

    #[tokio::test]
    async fn test_list_game_types_returns_copies() {
        let engine = engine_with(Arc::new(RecordingSink::default()), vec![]);
        let mut listed = engine.list_game_types();
        assert_eq!(listed.len(), 5);
        listed[0].max_valid_score = 9_999;
        assert_eq!(
            engine.config_for(GameType::ClickSpeed).unwrap().max_valid_score,
            180
        );
    }
}
