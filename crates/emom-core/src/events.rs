use std::cell::RefCell;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{ActiveTimerSettings, Phase, PreparationPhase, SessionPhaseState};

/// Every observable state change in a session produces an Event.
/// The presentation layer renders them; nothing in the core reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        settings: ActiveTimerSettings,
        at: DateTime<Utc>,
    },
    /// WORK <-> REST transition.
    PhaseChanged {
        phase: Phase,
        round: u32,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    RoundAdvanced {
        round: u32,
        at: DateTime<Utc>,
    },
    Paused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    Resumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Natural completion of the last round. Emitted once per session.
    Finished {
        rounds_completed: u32,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// Cancelled by the user before natural completion.
    Stopped {
        round: u32,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    PreparationSample {
        phase: PreparationPhase,
        display_value: u32,
        fill_progress: f64,
        at: DateTime<Utc>,
    },
    PreparationComplete {
        at: DateTime<Utc>,
    },
    CooldownStarted {
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    CooldownComplete {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionPhaseState,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Snake-case event name, used for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "session_started",
            Event::PhaseChanged { .. } => "phase_changed",
            Event::RoundAdvanced { .. } => "round_advanced",
            Event::Paused { .. } => "paused",
            Event::Resumed { .. } => "resumed",
            Event::Finished { .. } => "finished",
            Event::Stopped { .. } => "stopped",
            Event::PreparationSample { .. } => "preparation_sample",
            Event::PreparationComplete { .. } => "preparation_complete",
            Event::CooldownStarted { .. } => "cooldown_started",
            Event::CooldownComplete { .. } => "cooldown_complete",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}

/// Injected presentation capability.
///
/// Receives every event the session produces. Implementations must not
/// call back into the session.
pub trait EventSink {
    fn emit(&self, event: &Event);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &Event) {}
}

/// Keeps every event in order; handy for tests and replays.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: RefCell<Vec<Event>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.borrow().iter().filter(|e| e.name() == name).count()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &Event) {
        self.events.borrow_mut().push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: &Event) {
        (**self).emit(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::RoundAdvanced {
            round: 2,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RoundAdvanced");
        assert_eq!(json["round"], 2);
    }

    #[test]
    fn collecting_sink_counts_by_name() {
        let sink = CollectingSink::new();
        sink.emit(&Event::PreparationComplete { at: Utc::now() });
        sink.emit(&Event::CooldownComplete { at: Utc::now() });
        assert_eq!(sink.count("preparation_complete"), 1);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.events().is_empty());
    }
}
