mod ledger;
mod streak;

pub use ledger::{compute_stats, WorkoutLedger, WorkoutSession, WorkoutStats, SESSIONS_KEY, STATS_KEY};
pub use streak::streak_days;
