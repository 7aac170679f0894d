use crate::core::narration::{Language, NarrationConfig};
use crate::models::exercise::{CoachError, CoachResult};
use crate::models::safety::SafetyTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoachConfig {
    /// Per-exercise angle thresholds and cue texts
    pub safety: SafetyTable,
    /// Narration cooldown windows
    pub narration: NarrationConfig,
    /// Whether spoken coaching is on at startup
    pub narration_enabled: bool,
    /// Narration language
    pub language: Language,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            safety: SafetyTable::default(),
            narration: NarrationConfig::default(),
            narration_enabled: true,
            language: Language::English,
        }
    }
}

impl CoachConfig {
    /// Load configuration from file, creating with defaults if it doesn't exist
    pub fn load() -> CoachResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .map_err(|e| CoachError::InvalidConfig(format!("read config: {}", e)))?;
            let config: CoachConfig = serde_json::from_str(&contents)
                .map_err(|e| CoachError::InvalidConfig(format!("parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            // Create default config and save it
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> CoachResult<()> {
        self.validate()?;

        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoachError::InvalidConfig(format!("create config dir: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| CoachError::InvalidConfig(format!("serialize config: {}", e)))?;
        std::fs::write(&config_path, contents)
            .map_err(|e| CoachError::InvalidConfig(format!("write config: {}", e)))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> CoachResult<()> {
        self.safety.validate()?;

        if self.narration.routine_cooldown_ms == 0 {
            return Err(CoachError::InvalidConfig(
                "narration cooldown must be positive".to_string(),
            ));
        }

        Ok(())
    }

    fn config_path() -> CoachResult<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());

        let mut path = PathBuf::from(home);
        path.push(".formcoach");
        path.push("config.json");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exercise::ExerciseKind;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CoachConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        let mut config = CoachConfig::default();
        config.narration.routine_cooldown_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(CoachError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_safety_rule_fails_config_validation() {
        let config = CoachConfig::default();
        assert!(config.safety.get(ExerciseKind::Squat).is_some());

        let json = serde_json::to_string(&config).unwrap();
        let tampered = json.replace("\"ideal_min\":80.0", "\"ideal_min\":300.0");
        let parsed: CoachConfig = serde_json::from_str(&tampered).unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = CoachConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: CoachConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
