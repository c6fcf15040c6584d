//! # EMOM Core Library
//!
//! This library provides the core logic for an EMOM/HIIT interval timer.
//! Screens, animation and sound live outside; they feed user intents in
//! (start, pause/resume, stop) and render the events that come out.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based work/rest/round state machine that
//!   requires the caller to periodically invoke `tick()`
//! - **Preparation**: The ready / 3-2-1 / go countdown before a workout
//! - **History**: Workout session ledger with totals and day streak
//! - **Storage**: SQLite key-value blobs and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`IntervalEngine`]: Core interval state machine
//! - [`PreparationSequencer`]: Pre-workout countdown
//! - [`WorkoutLedger`]: Session history and statistics
//! - [`SessionRunner`]: Drives one workout from settings to history
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod history;
pub mod runner;
pub mod storage;
pub mod timer;

pub use clock::{tick_period, Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, PersistenceError};
pub use events::{CollectingSink, Event, EventSink, NoopSink};
pub use history::{WorkoutLedger, WorkoutSession, WorkoutStats};
pub use runner::{RunnerStage, SessionRunner};
pub use storage::{Config, Database, KeyValueStore, MemoryStore, TimerSettings};
pub use timer::{
    resolve_split, ActiveTimerSettings, IntervalEngine, Phase, PreparationPhase,
    PreparationSequencer, SessionOutcome, SessionPhaseState, WorkRestSplit,
};
