//! Static registry of game configurations.

use std::collections::HashMap;
use std::time::Duration;

use crate::games::types::{GameConfig, GameType};

/// Immutable lookup table mapping each game type to its configuration.
///
/// Populated once at engine construction; every accessor hands out
/// copies so callers cannot corrupt engine-wide defaults.
#[derive(Debug, Clone)]
pub struct GameCatalog {
    configs: HashMap<GameType, GameConfig>,
}

impl GameCatalog {
    /// Empty catalog. Useful for tests exercising the unsupported-type
    /// path; production code starts from `with_defaults`.
    pub fn empty() -> Self {
        Self {
            configs: HashMap::new(),
        }
    }

    /// The default configuration table for all supported game types.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::empty();

        catalog.insert(GameConfig {
            game_type: GameType::ClickSpeed,
            duration: Duration::from_secs(30),
            max_score: 200,
            points_per_score: 1.0,
            min_valid_score: 10,
            // Allow some variance but reject impossible click rates.
            max_valid_score: 180,
            difficulty: 2,
        });

        catalog.insert(GameConfig {
            game_type: GameType::MemoryMatch,
            duration: Duration::from_secs(60),
            max_score: 100,
            points_per_score: 2.0,
            min_valid_score: 5,
            max_valid_score: 90,
            difficulty: 3,
        });

        catalog.insert(GameConfig {
            game_type: GameType::NumberGuess,
            duration: Duration::from_secs(45),
            max_score: 50,
            points_per_score: 3.0,
            min_valid_score: 1,
            max_valid_score: 45,
            difficulty: 2,
        });

        catalog.insert(GameConfig {
            game_type: GameType::WordScramble,
            duration: Duration::from_secs(90),
            max_score: 80,
            points_per_score: 2.5,
            min_valid_score: 3,
            max_valid_score: 70,
            difficulty: 4,
        });

        catalog.insert(GameConfig {
            game_type: GameType::Puzzle,
            duration: Duration::from_secs(120),
            max_score: 60,
            points_per_score: 4.0,
            min_valid_score: 2,
            max_valid_score: 55,
            difficulty: 5,
        });

        catalog
    }

    /// Replaces (or adds) one entry. Consumed at construction time only;
    /// the catalog is read-only once the engine holds it.
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.insert(config);
        self
    }

    fn insert(&mut self, config: GameConfig) {
        self.configs.insert(config.game_type, config);
    }

    /// Configuration lookup. Returns a copy.
    pub fn config_for(&self, game_type: GameType) -> Option<GameConfig> {
        self.configs.get(&game_type).copied()
    }

    /// All configurations in stable listing order, as copies.
    pub fn all(&self) -> Vec<GameConfig> {
        GameType::ALL
            .iter()
            .filter_map(|game_type| self.config_for(*game_type))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl Default for GameCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}
