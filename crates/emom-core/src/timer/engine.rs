//! Interval session engine.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads or timers - the caller invokes `tick()` at a steady cadence and the
//! engine recomputes remaining time from the elapsed time since the previous
//! tick, scaled by the speed multiplier.
//!
//! ## State Transitions
//!
//! ```text
//! Work -> (Rest ->) Work -> ... -> Finished
//!   \__________________________/
//!      pause/resume (orthogonal), stop -> Stopped
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = IntervalEngine::start(settings, SystemClock)?;
//! // In a loop, every tick_period(base, multiplier):
//! for event in engine.tick() { /* render */ }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::ActiveTimerSettings;
use crate::clock::{elapsed_ms, Clock, SystemClock};
use crate::error::{CoreError, Result};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    Running,
    Paused,
    Finished,
    Stopped,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Finished,
    Stopped,
}

/// Read-only view of the engine for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPhaseState {
    pub current_round: u32,
    pub is_work_phase: bool,
    pub seconds_remaining_in_phase: f64,
    pub phase_duration_secs: u32,
    pub is_paused: bool,
    pub is_finished: bool,
    pub is_stopped: bool,
}

#[derive(Debug, Clone)]
pub struct IntervalEngine<C: Clock = SystemClock> {
    settings: ActiveTimerSettings,
    clock: C,
    status: EngineStatus,
    phase: Phase,
    current_round: u32,
    rounds_completed: u32,
    /// Scaled time spent in the current phase. May exceed the phase duration
    /// between a flush and the settle that follows it.
    phase_elapsed_ms: u64,
    /// Scaled time of every phase already completed.
    completed_ms: u64,
    /// Clock reading at the last flush; `None` while paused or ended.
    last_tick_at: Option<DateTime<Utc>>,
}

impl<C: Clock> IntervalEngine<C> {
    /// Start a session: round 1, work phase, full work duration.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the work interval is zero, or if a
    /// finite session has fewer than one round.
    pub fn start(settings: ActiveTimerSettings, clock: C) -> Result<Self> {
        settings.validate()?;
        let now = clock.now();
        tracing::info!(
            work = settings.work_interval_seconds,
            rest = settings.rest_interval_seconds,
            rounds = settings.total_rounds,
            infinite = settings.is_infinite_mode,
            speed = settings.speed_multiplier,
            "interval session started"
        );
        Ok(Self {
            settings,
            clock,
            status: EngineStatus::Running,
            phase: Phase::Work,
            current_round: 1,
            rounds_completed: 0,
            phase_elapsed_ms: 0,
            completed_ms: 0,
            last_tick_at: Some(now),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &ActiveTimerSettings {
        &self.settings
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn is_paused(&self) -> bool {
        self.status == EngineStatus::Paused
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.status {
            EngineStatus::Finished => Some(SessionOutcome::Finished),
            EngineStatus::Stopped => Some(SessionOutcome::Stopped),
            _ => None,
        }
    }

    pub fn phase_duration_ms(&self) -> u64 {
        match self.phase {
            Phase::Work => self.settings.work_ms(),
            Phase::Rest => self.settings.rest_ms(),
        }
    }

    pub fn remaining_ms(&self) -> u64 {
        if self.status == EngineStatus::Finished {
            return 0;
        }
        self.phase_duration_ms()
            .saturating_sub(self.phase_elapsed_ms)
    }

    /// Scaled session time so far, pauses excluded.
    pub fn elapsed_ms(&self) -> u64 {
        if self.status == EngineStatus::Finished {
            return self.completed_ms;
        }
        self.completed_ms + self.phase_elapsed_ms.min(self.phase_duration_ms())
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        let total = self.phase_duration_ms();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_ms() as f64 / total as f64)
    }

    pub fn state(&self) -> SessionPhaseState {
        SessionPhaseState {
            current_round: self.current_round,
            is_work_phase: self.phase == Phase::Work,
            seconds_remaining_in_phase: self.remaining_ms() as f64 / 1000.0,
            phase_duration_secs: match self.phase {
                Phase::Work => self.settings.work_interval_seconds,
                Phase::Rest => self.settings.rest_interval_seconds,
            },
            is_paused: self.status == EngineStatus::Paused,
            is_finished: self.status == EngineStatus::Finished,
            is_stopped: self.status == EngineStatus::Stopped,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Advance the clock. Returns the events produced, in order; a late tick
    /// may cross several phase boundaries.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.status != EngineStatus::Running {
            return events;
        }
        let now = self.clock.now();
        self.flush_elapsed(now);
        self.settle(now, &mut events);
        events
    }

    /// Freeze the clock. Time up to now is counted first, so any boundary it
    /// crossed is reported before the pause.
    ///
    /// # Errors
    /// Returns `SessionEnded` after the session finished or was stopped.
    pub fn pause(&mut self) -> Result<Vec<Event>> {
        match self.status {
            EngineStatus::Running => {
                let mut events = self.tick();
                if self.status == EngineStatus::Running {
                    self.status = EngineStatus::Paused;
                    self.last_tick_at = None;
                    events.push(Event::Paused {
                        remaining_ms: self.remaining_ms(),
                        at: self.clock.now(),
                    });
                }
                Ok(events)
            }
            EngineStatus::Paused => Ok(Vec::new()),
            EngineStatus::Finished => Err(CoreError::SessionEnded(SessionOutcome::Finished)),
            EngineStatus::Stopped => Err(CoreError::SessionEnded(SessionOutcome::Stopped)),
        }
    }

    /// # Errors
    /// Returns `SessionEnded` after the session finished or was stopped.
    pub fn resume(&mut self) -> Result<Vec<Event>> {
        match self.status {
            EngineStatus::Paused => {
                let now = self.clock.now();
                self.status = EngineStatus::Running;
                self.last_tick_at = Some(now);
                Ok(vec![Event::Resumed {
                    remaining_ms: self.remaining_ms(),
                    at: now,
                }])
            }
            EngineStatus::Running => Ok(Vec::new()),
            EngineStatus::Finished => Err(CoreError::SessionEnded(SessionOutcome::Finished)),
            EngineStatus::Stopped => Err(CoreError::SessionEnded(SessionOutcome::Stopped)),
        }
    }

    pub fn toggle_pause(&mut self) -> Result<Vec<Event>> {
        if self.is_paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Cancel the session. Time up to now is counted first, so boundaries the
    /// clock already crossed are reported, and a session whose last round ran
    /// out ends `Finished` rather than `Stopped`. Returns nothing if the
    /// session already ended.
    pub fn stop(&mut self) -> Vec<Event> {
        let mut events = match self.status {
            EngineStatus::Running => self.tick(),
            EngineStatus::Paused => Vec::new(),
            EngineStatus::Finished | EngineStatus::Stopped => return Vec::new(),
        };
        if self.outcome().is_some() {
            return events;
        }

        let now = self.clock.now();
        let elapsed = self.elapsed_ms();
        self.status = EngineStatus::Stopped;
        self.last_tick_at = None;
        tracing::info!(round = self.current_round, elapsed_ms = elapsed, "interval session stopped");
        events.push(Event::Stopped {
            round: self.current_round,
            elapsed_ms: elapsed,
            at: now,
        });
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.last_tick_at {
            let scaled = elapsed_ms(last, now).saturating_mul(u64::from(self.settings.speed_multiplier));
            self.phase_elapsed_ms = self.phase_elapsed_ms.saturating_add(scaled);
            self.last_tick_at = Some(now);
        }
    }

    /// Consume whole phases out of `phase_elapsed_ms`, carrying the overflow.
    fn settle(&mut self, now: DateTime<Utc>, events: &mut Vec<Event>) {
        while self.status == EngineStatus::Running {
            let duration = self.phase_duration_ms();
            if duration == 0 {
                // Only reachable if validation was bypassed; end rather than spin.
                tracing::error!(phase = ?self.phase, "zero-length phase, stopping session");
                self.status = EngineStatus::Stopped;
                self.last_tick_at = None;
                events.push(Event::Stopped {
                    round: self.current_round,
                    elapsed_ms: self.completed_ms,
                    at: now,
                });
                return;
            }
            if self.phase_elapsed_ms < duration {
                return;
            }
            let overflow = self.phase_elapsed_ms - duration;
            self.completed_ms = self.completed_ms.saturating_add(duration);
            self.phase_elapsed_ms = 0;
            self.complete_phase(now, events);
            if self.status == EngineStatus::Running {
                self.phase_elapsed_ms = overflow;
            }
        }
    }

    fn complete_phase(&mut self, now: DateTime<Utc>, events: &mut Vec<Event>) {
        if self.phase == Phase::Work && self.settings.rest_interval_seconds > 0 {
            self.phase = Phase::Rest;
            tracing::debug!(round = self.current_round, "work -> rest");
            events.push(Event::PhaseChanged {
                phase: Phase::Rest,
                round: self.current_round,
                duration_secs: self.settings.rest_interval_seconds,
                at: now,
            });
        } else {
            self.complete_round(now, events);
        }
    }

    fn complete_round(&mut self, now: DateTime<Utc>, events: &mut Vec<Event>) {
        self.rounds_completed = self.rounds_completed.saturating_add(1);

        if self.settings.is_infinite_mode || self.current_round < self.settings.total_rounds {
            let from_rest = self.phase == Phase::Rest;
            self.current_round = self.current_round.saturating_add(1);
            self.phase = Phase::Work;
            tracing::debug!(round = self.current_round, "round advanced");
            events.push(Event::RoundAdvanced {
                round: self.current_round,
                at: now,
            });
            if from_rest {
                events.push(Event::PhaseChanged {
                    phase: Phase::Work,
                    round: self.current_round,
                    duration_secs: self.settings.work_interval_seconds,
                    at: now,
                });
            }
        } else {
            self.status = EngineStatus::Finished;
            self.last_tick_at = None;
            tracing::info!(
                rounds = self.rounds_completed,
                elapsed_ms = self.completed_ms,
                "interval session finished"
            );
            events.push(Event::Finished {
                rounds_completed: self.rounds_completed,
                elapsed_ms: self.completed_ms,
                at: now,
            });
        }
    }
}
