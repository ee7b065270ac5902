//! TOML-based engine configuration.
//!
//! Process-level settings for the scheduling side of the engine: the local
//! rollover hour, the alert tolerance window, and the challenge length.
//! Stored at `~/.config/hardmode/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/hardmode/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Local hour (0-23) at which each user's day is judged and rolled over.
    #[serde(default = "default_rollover_hour")]
    pub rollover_hour: u32,
    /// Local hour of the final "day is still incomplete" warning.
    #[serde(default = "default_deadline_hour")]
    pub deadline_hour: u32,
    /// Minutes either side of a configured alert time that still count.
    #[serde(default = "default_alert_tolerance")]
    pub alert_tolerance_min: u32,
    /// Total days in the challenge.
    #[serde(default = "default_challenge_days")]
    pub challenge_days: u32,
}

fn default_rollover_hour() -> u32 {
    5
}

fn default_deadline_hour() -> u32 {
    0
}

fn default_alert_tolerance() -> u32 {
    5
}

fn default_challenge_days() -> u32 {
    75
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rollover_hour: default_rollover_hour(),
            deadline_hour: default_deadline_hour(),
            alert_tolerance_min: default_alert_tolerance(),
            challenge_days: default_challenge_days(),
        }
    }
}

impl EngineConfig {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, creating the default file on first run.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let config = toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Validate hour/window ranges after manual edits.
    pub fn validate(&self) -> Result<()> {
        if self.rollover_hour > 23 {
            return Err(ConfigError::InvalidValue {
                key: "rollover_hour".to_string(),
                message: format!("{} is not a valid hour", self.rollover_hour),
            }
            .into());
        }
        if self.deadline_hour > 23 {
            return Err(ConfigError::InvalidValue {
                key: "deadline_hour".to_string(),
                message: format!("{} is not a valid hour", self.deadline_hour),
            }
            .into());
        }
        if self.alert_tolerance_min == 0 || self.alert_tolerance_min > 30 {
            return Err(ConfigError::InvalidValue {
                key: "alert_tolerance_min".to_string(),
                message: "must be between 1 and 30 minutes".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_program_rules() {
        let config = EngineConfig::default();
        assert_eq!(config.rollover_hour, 5);
        assert_eq!(config.challenge_days, 75);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_hours() {
        let config = EngineConfig {
            rollover_hour: 24,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = EngineConfig::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let back: EngineConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back.rollover_hour, config.rollover_hour);
        assert_eq!(back.alert_tolerance_min, config.alert_tolerance_min);
    }
}
