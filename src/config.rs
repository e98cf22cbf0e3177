//! Configuration for the arcade server.
//!
//! Settings resolve in three layers: built-in defaults, an optional TOML
//! file, then environment variable overrides. The final settings are
//! validated before use.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::games::catalog::GameCatalog;
use crate::games::types::GameType;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub reaper: ReaperSettings,
    /// Per-game overrides of the catalog defaults, keyed by game type
    /// tag (e.g. `[games.click_speed]`).
    pub games: HashMap<String, GameOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaperSettings {
    pub sweep_interval_secs: u64,
    pub grace_secs: u64,
}

impl Default for ReaperSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
            grace_secs: 600,
        }
    }
}

impl ReaperSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

/// Optional per-game catalog overrides. Unset fields keep the default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOverride {
    pub duration_secs: Option<u64>,
    pub max_score: Option<i64>,
    pub points_per_score: Option<f64>,
    pub min_valid_score: Option<i64>,
    pub max_valid_score: Option<i64>,
    pub difficulty: Option<u8>,
}

impl EngineSettings {
    /// Builds the game catalog: defaults merged with any `[games.*]`
    /// overrides. Assumes `validate` has already accepted the settings.
    pub fn catalog(&self) -> Result<GameCatalog, ConfigError> {
        let mut catalog = GameCatalog::with_defaults();

        for (key, over) in &self.games {
            let game_type: GameType = key.parse().map_err(|_| ConfigError::InvalidValue {
                field: format!("games.{}", key),
                reason: "unknown game type".to_string(),
            })?;
            let mut config = catalog
                .config_for(game_type)
                .expect("defaults cover every game type");

            if let Some(secs) = over.duration_secs {
                config.duration = Duration::from_secs(secs);
            }
            if let Some(max_score) = over.max_score {
                config.max_score = max_score;
            }
            if let Some(points_per_score) = over.points_per_score {
                config.points_per_score = points_per_score;
            }
            if let Some(min_valid_score) = over.min_valid_score {
                config.min_valid_score = min_valid_score;
            }
            if let Some(max_valid_score) = over.max_valid_score {
                config.max_valid_score = max_valid_score;
            }
            if let Some(difficulty) = over.difficulty {
                config.difficulty = difficulty;
            }

            catalog = catalog.with_config(config);
        }

        Ok(catalog)
    }
}

/// Loads settings from file and environment with validation.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn load(&self) -> Result<EngineSettings, ConfigError> {
        let mut settings = match &self.config_path {
            Some(path) => Self::load_from_file(path)?,
            None => EngineSettings::default(),
        };

        Self::apply_env_overrides(&mut settings)?;
        Self::validate(&settings)?;

        Ok(settings)
    }

    fn load_from_file(path: &Path) -> Result<EngineSettings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadFailed(format!("failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(settings: &mut EngineSettings) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("ARCADE_API_HOST") {
            settings.api.host = host;
        }
        if let Ok(port) = env::var("ARCADE_API_PORT") {
            settings.api.port = Self::parse_env("ARCADE_API_PORT", &port)?;
        }
        if let Ok(secs) = env::var("ARCADE_REAPER_SWEEP_SECS") {
            settings.reaper.sweep_interval_secs =
                Self::parse_env("ARCADE_REAPER_SWEEP_SECS", &secs)?;
        }
        if let Ok(secs) = env::var("ARCADE_REAPER_GRACE_SECS") {
            settings.reaper.grace_secs = Self::parse_env("ARCADE_REAPER_GRACE_SECS", &secs)?;
        }
        Ok(())
    }

    fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
        value.parse().map_err(|_| ConfigError::InvalidValue {
            field: name.to_string(),
            reason: format!("cannot parse '{}'", value),
        })
    }

    fn validate(settings: &EngineSettings) -> Result<(), ConfigError> {
        if settings.api.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.request_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if settings.reaper.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reaper.sweep_interval_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        for (key, over) in &settings.games {
            if key.parse::<GameType>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field: format!("games.{}", key),
                    reason: "unknown game type".to_string(),
                });
            }
            if let Some(difficulty) = over.difficulty {
                if !(1..=5).contains(&difficulty) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("games.{}.difficulty", key),
                        reason: "must be between 1 and 5".to_string(),
                    });
                }
            }
            if let Some(secs) = over.duration_secs {
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: format!("games.{}.duration_secs", key),
                        reason: "must be greater than zero".to_string(),
                    });
                }
            }
            if let (Some(min), Some(max)) = (over.min_valid_score, over.max_valid_score) {
                if min > max {
                    return Err(ConfigError::InvalidValue {
                        field: format!("games.{}", key),
                        reason: format!("min_valid_score {} exceeds max_valid_score {}", min, max),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_load_and_validate() {
        let settings = ConfigLoader::new().load().unwrap();
        assert_eq!(settings.api.port, 8080);
        assert_eq!(settings.reaper.sweep_interval_secs, 300);
        assert_eq!(settings.reaper.grace_secs, 600);
        assert!(settings.games.is_empty());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
port = 9090

[reaper]
sweep_interval_secs = 60
grace_secs = 120

[games.click_speed]
duration_secs = 10
max_valid_score = 60
"#
        )
        .unwrap();

        let settings = ConfigLoader::new().with_path(file.path()).load().unwrap();
        assert_eq!(settings.api.port, 9090);
        assert_eq!(settings.reaper.grace_secs, 120);

        let catalog = settings.catalog().unwrap();
        let config = catalog.config_for(GameType::ClickSpeed).unwrap();
        assert_eq!(config.duration, Duration::from_secs(10));
        assert_eq!(config.max_valid_score, 60);
        // Untouched fields keep their defaults.
        assert_eq!(config.min_valid_score, 10);
        assert_eq!(config.difficulty, 2);
    }

    #[test]
    fn test_missing_file_fails() {
        let err = ConfigLoader::new()
            .with_path("/nonexistent/arcade.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed(_)));
    }

    #[test]
    fn test_unknown_game_key_rejected() {
        let mut settings = EngineSettings::default();
        settings
            .games
            .insert("teleport".to_string(), GameOverride::default());
        let err = ConfigLoader::validate(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "games.teleport"));
    }

    #[test]
    fn test_difficulty_out_of_range_rejected() {
        let mut settings = EngineSettings::default();
        settings.games.insert(
            "puzzle".to_string(),
            GameOverride {
                difficulty: Some(9),
                ..GameOverride::default()
            },
        );
        let err = ConfigLoader::validate(&settings).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { field, .. } if field == "games.puzzle.difficulty")
        );
    }

    #[test]
    fn test_inverted_validity_band_rejected() {
        let mut settings = EngineSettings::default();
        settings.games.insert(
            "number_guess".to_string(),
            GameOverride {
                min_valid_score: Some(50),
                max_valid_score: Some(10),
                ..GameOverride::default()
            },
        );
        assert!(ConfigLoader::validate(&settings).is_err());
    }
}
