//! TOML-based application configuration.
//!
//! Stores the user's timer choices:
//! - Round count or infinite mode
//! - Work/rest split and rest seconds
//! - Preparation and cooldown durations
//! - Speed-up flag
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::{resolve_split, ActiveTimerSettings, WorkRestSplit, SPEED_UP_MULTIPLIER};

/// Timer settings snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_number_of_rounds")]
    pub number_of_rounds: u32,
    #[serde(default)]
    pub is_infinite_mode: bool,
    #[serde(default)]
    pub rest_interval_seconds: u32,
    /// Catalog id; unknown ids resolve to the 60/0 default.
    #[serde(default = "default_split")]
    pub selected_split: String,
    #[serde(default)]
    pub preparation_seconds: u32,
    #[serde(default)]
    pub cooldown_seconds: u32,
    #[serde(default)]
    pub speed_up_enabled: bool,
    #[serde(default = "default_preset_rounds")]
    pub preset_rounds: Vec<u32>,
}

const SELECTED_SPLIT_KEY: &str = "timer.selected_split";

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerSettings,
}

// Default functions
fn default_number_of_rounds() -> u32 {
    10
}
fn default_split() -> String {
    WorkRestSplit::None.id().to_string()
}
fn default_preset_rounds() -> Vec<u32> {
    vec![5, 10, 12, 15, 20, 30, 45, 60]
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            number_of_rounds: default_number_of_rounds(),
            is_infinite_mode: false,
            rest_interval_seconds: 0,
            selected_split: default_split(),
            preparation_seconds: 0,
            cooldown_seconds: 0,
            speed_up_enabled: false,
            preset_rounds: default_preset_rounds(),
        }
    }
}

impl TimerSettings {
    pub fn speed_multiplier(&self) -> u32 {
        if self.speed_up_enabled {
            SPEED_UP_MULTIPLIER
        } else {
            1
        }
    }

    /// Select a split; its rest seconds replace the current rest interval.
    pub fn select_split(&mut self, split: WorkRestSplit) {
        self.selected_split = split.id().to_string();
        self.rest_interval_seconds = split.durations().rest_seconds;
    }

    /// Freeze this snapshot into the parameters of one session.
    pub fn active_settings(&self) -> ActiveTimerSettings {
        let split = resolve_split(&self.selected_split);
        ActiveTimerSettings {
            work_interval_seconds: split.work_seconds,
            rest_interval_seconds: self.rest_interval_seconds,
            total_rounds: self.number_of_rounds,
            is_infinite_mode: self.is_infinite_mode,
            speed_multiplier: self.speed_multiplier(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("'{value}': {e}")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config unavailable, using defaults");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The value is coerced to the
    /// type of the existing field. Does not touch the disk.
    ///
    /// `timer.selected_split` must name a catalog split, and selecting one
    /// also replaces the rest interval with the split's rest.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if key == SELECTED_SPLIT_KEY {
            let split = value
                .parse::<WorkRestSplit>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message,
                })?;
            self.timer.select_split(split);
            return Ok(());
        }

        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}
