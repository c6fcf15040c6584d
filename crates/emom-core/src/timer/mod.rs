mod catalog;
mod cooldown;
mod engine;
mod preparation;
mod settings;

pub use catalog::{resolve_split, SplitDurations, WorkRestSplit, FALLBACK_WORK_SECONDS};
pub use cooldown::Cooldown;
pub use engine::{EngineStatus, IntervalEngine, Phase, SessionOutcome, SessionPhaseState};
pub use preparation::{
    sample_at, PreparationPhase, PreparationSample, PreparationSequencer, PreparationStatus,
    PreparationTimeline, GO_HOLD_MS,
};
pub use settings::{ActiveTimerSettings, SPEED_UP_MULTIPLIER};
