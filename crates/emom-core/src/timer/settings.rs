use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Speed multiplier used when speed-up is enabled.
pub const SPEED_UP_MULTIPLIER: u32 = 4;

/// Immutable per-session timer parameters.
///
/// Built once from the settings snapshot when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTimerSettings {
    pub work_interval_seconds: u32,
    pub rest_interval_seconds: u32,
    /// Ignored when `is_infinite_mode` is set.
    pub total_rounds: u32,
    pub is_infinite_mode: bool,
    pub speed_multiplier: u32,
}

impl ActiveTimerSettings {
    pub fn new(work_interval_seconds: u32, rest_interval_seconds: u32, total_rounds: u32) -> Self {
        Self {
            work_interval_seconds,
            rest_interval_seconds,
            total_rounds,
            is_infinite_mode: false,
            speed_multiplier: 1,
        }
    }

    pub fn infinite(mut self) -> Self {
        self.is_infinite_mode = true;
        self
    }

    pub fn with_speed_multiplier(mut self, speed_multiplier: u32) -> Self {
        self.speed_multiplier = speed_multiplier;
        self
    }

    /// # Errors
    /// Returns `InvalidConfiguration` if the settings cannot drive a session.
    pub fn validate(&self) -> Result<()> {
        if self.work_interval_seconds == 0 {
            return Err(CoreError::invalid(
                "work_interval_seconds",
                "must be greater than zero",
            ));
        }
        if !self.is_infinite_mode && self.total_rounds < 1 {
            return Err(CoreError::invalid(
                "total_rounds",
                "must be at least 1 unless infinite mode is enabled",
            ));
        }
        if self.speed_multiplier == 0 {
            return Err(CoreError::invalid(
                "speed_multiplier",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn work_ms(&self) -> u64 {
        u64::from(self.work_interval_seconds).saturating_mul(1000)
    }

    pub fn rest_ms(&self) -> u64 {
        u64::from(self.rest_interval_seconds).saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_work() {
        let err = ActiveTimerSettings::new(0, 10, 3).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration { ref field, .. } if field == "work_interval_seconds"));
    }

    #[test]
    fn zero_rounds_only_valid_in_infinite_mode() {
        assert!(ActiveTimerSettings::new(60, 0, 0).validate().is_err());
        assert!(ActiveTimerSettings::new(60, 0, 0).infinite().validate().is_ok());
    }

    #[test]
    fn rest_may_be_zero() {
        assert!(ActiveTimerSettings::new(60, 0, 1).validate().is_ok());
    }
}
