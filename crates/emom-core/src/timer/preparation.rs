//! Pre-workout countdown.
//!
//! Preparation time counts down continuously. The last three seconds show the
//! digits 3, 2, 1 (one second each), then `Go` is held briefly before the
//! sequencer completes. Every sample is a pure function of elapsed time, so a
//! late or skipped tick never shows a stale value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{elapsed_ms, Clock, SystemClock};
use crate::events::Event;

/// How long `Go` stays on screen, in unscaled milliseconds.
pub const GO_HOLD_MS: u64 = 800;

const COUNTDOWN_FROM_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreparationPhase {
    Ready,
    Countdown3,
    Countdown2,
    Countdown1,
    Go,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreparationSample {
    pub phase: PreparationPhase,
    /// Whole seconds left while `Ready`, the digit while counting down, 0 at `Go`.
    pub display_value: u32,
    /// 0.0 at the start, 1.0 from `Go` onwards.
    pub fill_progress: f64,
}

/// Sample the countdown `elapsed_ms` into a preparation of `preparation_ms`.
pub fn sample_at(preparation_ms: u64, elapsed_ms: u64) -> PreparationSample {
    if elapsed_ms >= preparation_ms {
        return PreparationSample {
            phase: PreparationPhase::Go,
            display_value: 0,
            fill_progress: 1.0,
        };
    }

    let remaining_ms = preparation_ms - elapsed_ms;
    let display_value = remaining_ms.div_ceil(1000) as u32;
    let fill_progress = elapsed_ms as f64 / preparation_ms as f64;
    let phase = if remaining_ms > COUNTDOWN_FROM_MS {
        PreparationPhase::Ready
    } else {
        match display_value {
            3 => PreparationPhase::Countdown3,
            2 => PreparationPhase::Countdown2,
            _ => PreparationPhase::Countdown1,
        }
    };

    PreparationSample {
        phase,
        display_value,
        fill_progress,
    }
}

/// Lazy, deterministic sequence of samples taken every `step_ms` of scaled
/// time, ending with the first sample at or past the end of the `Go` hold.
#[derive(Debug, Clone)]
pub struct PreparationTimeline {
    preparation_ms: u64,
    step_ms: u64,
    next_ms: Option<u64>,
}

impl PreparationTimeline {
    pub fn new(preparation_seconds: u32, step_ms: u64) -> Self {
        Self {
            preparation_ms: u64::from(preparation_seconds) * 1000,
            step_ms: step_ms.max(1),
            next_ms: Some(0),
        }
    }
}

impl Iterator for PreparationTimeline {
    type Item = PreparationSample;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next_ms?;
        let end = self.preparation_ms + GO_HOLD_MS;
        self.next_ms = if at >= end {
            None
        } else {
            Some((at + self.step_ms).min(end))
        };
        Some(sample_at(self.preparation_ms, at))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreparationStatus {
    Running,
    Complete,
    Cancelled,
}

/// Drives the countdown from a clock.
#[derive(Debug, Clone)]
pub struct PreparationSequencer<C: Clock = SystemClock> {
    clock: C,
    preparation_ms: u64,
    speed_multiplier: u32,
    started_at: DateTime<Utc>,
    status: PreparationStatus,
    last_phase: Option<PreparationPhase>,
}

impl<C: Clock> PreparationSequencer<C> {
    /// Returns `None` when `preparation_seconds` is zero: preparation is
    /// disabled and the caller goes straight to the workout.
    pub fn new(preparation_seconds: u32, speed_multiplier: u32, clock: C) -> Option<Self> {
        if preparation_seconds == 0 {
            return None;
        }
        let started_at = clock.now();
        Some(Self {
            clock,
            preparation_ms: u64::from(preparation_seconds) * 1000,
            speed_multiplier: speed_multiplier.max(1),
            started_at,
            status: PreparationStatus::Running,
            last_phase: None,
        })
    }

    pub fn status(&self) -> PreparationStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == PreparationStatus::Running
    }

    /// Scaled time since the sequencer started.
    pub fn elapsed_ms(&self) -> u64 {
        elapsed_ms(self.started_at, self.clock.now())
            .saturating_mul(u64::from(self.speed_multiplier))
    }

    pub fn current(&self) -> PreparationSample {
        sample_at(self.preparation_ms, self.elapsed_ms())
    }

    /// Emit the current sample, plus `PreparationComplete` once the `Go` hold
    /// has elapsed. Nothing is emitted after completion or cancellation.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.status != PreparationStatus::Running {
            return events;
        }

        let now = self.clock.now();
        let elapsed = self.elapsed_ms();
        let sample = sample_at(self.preparation_ms, elapsed);
        if self.last_phase != Some(sample.phase) {
            tracing::debug!(phase = ?sample.phase, "preparation phase");
            self.last_phase = Some(sample.phase);
        }
        events.push(Event::PreparationSample {
            phase: sample.phase,
            display_value: sample.display_value,
            fill_progress: sample.fill_progress,
            at: now,
        });

        if elapsed >= self.preparation_ms + GO_HOLD_MS {
            self.status = PreparationStatus::Complete;
            events.push(Event::PreparationComplete { at: now });
        }
        events
    }

    /// Returns `false` if the sequencer had already stopped.
    pub fn cancel(&mut self) -> bool {
        if self.status != PreparationStatus::Running {
            return false;
        }
        self.status = PreparationStatus::Cancelled;
        tracing::debug!("preparation cancelled");
        true
    }
}
