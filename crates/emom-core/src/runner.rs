//! Session runner.
//!
//! Wires one workout end to end: settings snapshot -> preparation countdown
//! (skipped when zero) -> interval engine -> optional cooldown, recording the
//! session in the ledger. Exactly one timing source is live at a time; it is
//! replaced, never stacked, when the stage changes.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::{Event, EventSink};
use crate::history::WorkoutLedger;
use crate::storage::{KeyValueStore, TimerSettings};
use crate::timer::{
    ActiveTimerSettings, Cooldown, IntervalEngine, PreparationSequencer, SessionOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerStage {
    Idle,
    Preparing,
    Running,
    CoolingDown,
    Done(SessionOutcome),
}

enum Stage<C: Clock> {
    Idle,
    Preparing(PreparationSequencer<C>),
    Running(IntervalEngine<C>),
    CoolingDown(Cooldown<C>),
    Done(SessionOutcome),
}

pub struct SessionRunner<S: KeyValueStore, K: EventSink, C: Clock + Clone> {
    clock: C,
    ledger: WorkoutLedger<S, C>,
    sink: K,
    stage: Stage<C>,
    snapshot: Option<TimerSettings>,
    session_id: Option<String>,
}

/// Whole minutes for the ledger, rounded to nearest.
fn minutes_from_ms(ms: u64) -> u64 {
    (ms + 30_000) / 60_000
}

impl<S: KeyValueStore, K: EventSink, C: Clock + Clone> SessionRunner<S, K, C> {
    pub fn new(ledger: WorkoutLedger<S, C>, sink: K, clock: C) -> Self {
        Self {
            clock,
            ledger,
            sink,
            stage: Stage::Idle,
            snapshot: None,
            session_id: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn stage(&self) -> RunnerStage {
        match &self.stage {
            Stage::Idle => RunnerStage::Idle,
            Stage::Preparing(_) => RunnerStage::Preparing,
            Stage::Running(_) => RunnerStage::Running,
            Stage::CoolingDown(_) => RunnerStage::CoolingDown,
            Stage::Done(outcome) => RunnerStage::Done(*outcome),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Idle | Stage::Done(_))
    }

    pub fn engine(&self) -> Option<&IntervalEngine<C>> {
        match &self.stage {
            Stage::Running(engine) => Some(engine),
            _ => None,
        }
    }

    pub fn ledger(&self) -> &WorkoutLedger<S, C> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut WorkoutLedger<S, C> {
        &mut self.ledger
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Id of the ledger entry for the current session, once the engine runs.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a workout from a settings snapshot. Any session in progress is
    /// stopped first.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the snapshot cannot drive a session;
    /// the runner is left as it was.
    pub fn start(&mut self, snapshot: &TimerSettings) -> Result<()> {
        let active = snapshot.active_settings();
        active.validate()?;

        if !self.is_done() {
            self.stop();
        }
        self.snapshot = Some(snapshot.clone());
        self.session_id = None;

        match PreparationSequencer::new(
            snapshot.preparation_seconds,
            active.speed_multiplier,
            self.clock.clone(),
        ) {
            Some(sequencer) => {
                tracing::info!(seconds = snapshot.preparation_seconds, "preparation started");
                self.stage = Stage::Preparing(sequencer);
                // First sample right away so the view is never blank.
                self.tick();
            }
            None => self.start_engine(active),
        }
        Ok(())
    }

    /// Advance whichever timing source is live.
    pub fn tick(&mut self) {
        match &mut self.stage {
            Stage::Preparing(sequencer) => {
                let events = sequencer.tick();
                let complete = events
                    .iter()
                    .any(|e| matches!(e, Event::PreparationComplete { .. }));
                self.emit_all(&events);
                if complete {
                    let active = self.active_settings();
                    self.start_engine(active);
                }
            }
            Stage::Running(engine) => {
                let events = engine.tick();
                let finished = engine.outcome() == Some(SessionOutcome::Finished);
                let elapsed = engine.elapsed_ms();
                self.emit_all(&events);
                if finished {
                    self.on_finished(elapsed);
                }
            }
            Stage::CoolingDown(cooldown) => {
                if let Some(event) = cooldown.tick() {
                    self.emit(&event);
                    self.stage = Stage::Done(SessionOutcome::Finished);
                }
            }
            Stage::Idle | Stage::Done(_) => {}
        }
    }

    /// # Errors
    /// Returns `SessionEnded` if the engine already finished or stopped.
    pub fn pause(&mut self) -> Result<()> {
        self.control(|engine| engine.pause())
    }

    /// # Errors
    /// Returns `SessionEnded` if the engine already finished or stopped.
    pub fn resume(&mut self) -> Result<()> {
        self.control(|engine| engine.resume())
    }

    /// # Errors
    /// Returns `SessionEnded` if the engine already finished or stopped.
    pub fn toggle_pause(&mut self) -> Result<()> {
        self.control(|engine| engine.toggle_pause())
    }

    /// Cancel the current session. A stopped workout is removed from the
    /// ledger, but one whose last round already ran out by the clock is
    /// recorded as finished. Stopping during cooldown only skips the cooldown.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Preparing(mut sequencer) => {
                sequencer.cancel();
                self.emit(&Event::Stopped {
                    round: 0,
                    elapsed_ms: 0,
                    at: self.clock.now(),
                });
                self.stage = Stage::Done(SessionOutcome::Stopped);
            }
            Stage::Running(mut engine) => {
                let events = engine.stop();
                self.emit_all(&events);
                if engine.outcome() == Some(SessionOutcome::Finished) {
                    self.record_finished(engine.elapsed_ms());
                    self.stage = Stage::Done(SessionOutcome::Finished);
                } else {
                    if let Some(id) = self.session_id.take() {
                        self.ledger.cancel_workout(&id);
                    }
                    self.stage = Stage::Done(SessionOutcome::Stopped);
                }
            }
            Stage::CoolingDown(_) => {
                tracing::debug!("cooldown skipped");
                self.emit(&Event::CooldownComplete {
                    at: self.clock.now(),
                });
                self.stage = Stage::Done(SessionOutcome::Finished);
            }
            other => self.stage = other,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn active_settings(&self) -> ActiveTimerSettings {
        self.snapshot
            .as_ref()
            .map(TimerSettings::active_settings)
            .unwrap_or_else(|| TimerSettings::default().active_settings())
    }

    fn start_engine(&mut self, active: ActiveTimerSettings) {
        match IntervalEngine::start(active, self.clock.clone()) {
            Ok(engine) => {
                self.session_id = Some(self.ledger.start_workout(active.total_rounds));
                self.emit(&Event::SessionStarted {
                    settings: active,
                    at: self.clock.now(),
                });
                self.stage = Stage::Running(engine);
            }
            Err(e) => {
                tracing::error!(error = %e, "engine refused settings, session stopped");
                self.emit(&Event::Stopped {
                    round: 0,
                    elapsed_ms: 0,
                    at: self.clock.now(),
                });
                self.stage = Stage::Done(SessionOutcome::Stopped);
            }
        }
    }

    fn record_finished(&mut self, elapsed_ms: u64) {
        if let Some(id) = self.session_id.take() {
            self.ledger.complete_workout(&id, minutes_from_ms(elapsed_ms));
        }
    }

    fn on_finished(&mut self, elapsed_ms: u64) {
        self.record_finished(elapsed_ms);

        let (cooldown_seconds, speed) = self
            .snapshot
            .as_ref()
            .map(|s| (s.cooldown_seconds, s.speed_multiplier()))
            .unwrap_or((0, 1));
        match Cooldown::start(cooldown_seconds, speed, self.clock.clone()) {
            Some((cooldown, started)) => {
                self.emit(&started);
                self.stage = Stage::CoolingDown(cooldown);
            }
            None => self.stage = Stage::Done(SessionOutcome::Finished),
        }
    }

    fn control<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut IntervalEngine<C>) -> Result<Vec<Event>>,
    {
        let Stage::Running(engine) = &mut self.stage else {
            return match &self.stage {
                Stage::Done(outcome) => Err(CoreError::SessionEnded(*outcome)),
                _ => Ok(()),
            };
        };
        let events = f(engine)?;
        let finished = engine.outcome() == Some(SessionOutcome::Finished);
        let elapsed = engine.elapsed_ms();
        self.emit_all(&events);
        if finished {
            self.on_finished(elapsed);
        }
        Ok(())
    }

    fn emit(&self, event: &Event) {
        tracing::trace!(event = event.name(), "emit");
        self.sink.emit(event);
    }

    fn emit_all(&self, events: &[Event]) {
        for event in events {
            self.emit(event);
        }
    }
}
