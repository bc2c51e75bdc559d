//! Level Configuration
//!
//! Tunable movement parameters, in world pixels and milliseconds.
//! Loaded from JSON; every field has a default.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{
    Fixed, from_int,
    PLAYER_RUN_SPEED, PLAYER_JUMP_SPEED, GRAVITY, ENEMY_PATROL_SPEED, BULLET_SPEED,
};

/// Configuration could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Not valid JSON / wrong shape
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A speed or size that must be positive is not
    #[error("Config field `{0}` must be positive")]
    NotPositive(&'static str),
}

/// Configuration for level simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Player run speed (fixed px/s)
    pub run_speed: Fixed,
    /// Player jump speed (fixed px/s, applied upwards)
    pub jump_speed: Fixed,
    /// Gravity for dynamic bodies (fixed px/s²)
    pub gravity: Fixed,
    /// Enemy patrol speed (fixed px/s)
    pub enemy_speed: Fixed,
    /// Bullet speed (fixed px/s)
    pub bullet_speed: Fixed,
    /// Bullet lifetime in milliseconds
    pub bullet_lifetime_ms: u64,
    /// Camera viewport width (fixed px)
    pub viewport_width: Fixed,
    /// Camera viewport height (fixed px)
    pub viewport_height: Fixed,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            run_speed: PLAYER_RUN_SPEED,
            jump_speed: PLAYER_JUMP_SPEED,
            gravity: GRAVITY,
            enemy_speed: ENEMY_PATROL_SPEED,
            bullet_speed: BULLET_SPEED,
            bullet_lifetime_ms: 2000,
            viewport_width: from_int(400),
            viewport_height: from_int(240),
        }
    }
}

impl LevelConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field that must be positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("run_speed", self.run_speed),
            ("jump_speed", self.jump_speed),
            ("enemy_speed", self.enemy_speed),
            ("bullet_speed", self.bullet_speed),
            ("viewport_width", self.viewport_width),
            ("viewport_height", self.viewport_height),
        ];
        for (name, value) in fields {
            if value <= 0 {
                return Err(ConfigError::NotPositive(name));
            }
        }
        if self.bullet_lifetime_ms == 0 {
            return Err(ConfigError::NotPositive("bullet_lifetime_ms"));
        }
        Ok(())
    }

    /// Bullet lifetime as a duration.
    pub fn bullet_lifetime(&self) -> Duration {
        Duration::from_millis(self.bullet_lifetime_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LevelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bullet_lifetime(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = LevelConfig::from_json(r#"{ "bullet_lifetime_ms": 500 }"#).unwrap();
        assert_eq!(config.bullet_lifetime_ms, 500);
        assert_eq!(config.run_speed, PLAYER_RUN_SPEED);
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            LevelConfig::from_json(r#"{ "enemy_speed": 0 }"#),
            Err(ConfigError::NotPositive("enemy_speed"))
        ));
        assert!(matches!(LevelConfig::from_json("not json"), Err(ConfigError::Json(_))));
    }
}
