//! Workout history ledger.
//!
//! Records session start, completion and cancellation, and keeps the derived
//! [`WorkoutStats`] in step with the session list. Every mutation is followed
//! by a save of both blobs; a failed save or load is logged and the in-memory
//! list stays authoritative.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::streak::streak_days;
use crate::clock::{local_day, Clock, SystemClock};
use crate::error::{CoreError, PersistenceError, Result};
use crate::storage::KeyValueStore;

pub const SESSIONS_KEY: &str = "workout_sessions";
pub const STATS_KEY: &str = "workout_stats";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub rounds: u32,
    pub duration_minutes: u64,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutStats {
    pub total_workouts: u64,
    pub total_time_minutes: u64,
    pub streak_days: u32,
}

/// Derive stats from a session list. Only completed sessions count.
pub fn compute_stats(sessions: &[WorkoutSession], today: NaiveDate) -> WorkoutStats {
    let completed = || sessions.iter().filter(|s| s.completed);
    WorkoutStats {
        total_workouts: completed().count() as u64,
        total_time_minutes: completed().map(|s| s.duration_minutes).sum(),
        streak_days: streak_days(completed().map(|s| local_day(s.started_at)), today),
    }
}

pub struct WorkoutLedger<S: KeyValueStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    sessions: Vec<WorkoutSession>,
    stats: WorkoutStats,
}

impl<S: KeyValueStore, C: Clock> WorkoutLedger<S, C> {
    /// Load the session list from `store`. An unreadable or corrupt list is
    /// logged and replaced by an empty one.
    ///
    /// No session is live when a ledger opens, so in-progress entries are
    /// leftovers of a process that died mid-workout. They are dropped here and
    /// disappear from the store with the next save.
    pub fn open(store: S, clock: C) -> Self {
        let mut sessions = match Self::load_sessions(&store) {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(error = %e, "could not load workout sessions, starting empty");
                Vec::new()
            }
        };
        let loaded = sessions.len();
        sessions.retain(|s| s.completed);
        if sessions.len() < loaded {
            tracing::info!(dropped = loaded - sessions.len(), "dropped unfinished workouts");
        }
        let stats = compute_stats(&sessions, clock.today());
        Self {
            store,
            clock,
            sessions,
            stats,
        }
    }

    fn load_sessions(store: &S) -> Result<Vec<WorkoutSession>> {
        match store.load(SESSIONS_KEY)? {
            Some(blob) => serde_json::from_str(&blob).map_err(|e| {
                PersistenceError::Codec {
                    key: SESSIONS_KEY.to_string(),
                    message: e.to_string(),
                }
                .into()
            }),
            None => Ok(Vec::new()),
        }
    }

    pub fn sessions(&self) -> &[WorkoutSession] {
        &self.sessions
    }

    pub fn completed_sessions(&self) -> impl Iterator<Item = &WorkoutSession> {
        self.sessions.iter().filter(|s| s.completed)
    }

    pub fn stats(&self) -> WorkoutStats {
        self.stats
    }

    pub fn session(&self, session_id: &str) -> Option<&WorkoutSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Recompute stats against the current day, e.g. after midnight passes.
    pub fn refresh_stats(&mut self) -> WorkoutStats {
        self.stats = compute_stats(&self.sessions, self.clock.today());
        self.stats
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append an in-progress session and return its id.
    pub fn start_workout(&mut self, rounds: u32) -> String {
        let session = WorkoutSession {
            id: Uuid::new_v4().to_string(),
            started_at: self.clock.now(),
            rounds,
            duration_minutes: 0,
            completed: false,
        };
        let id = session.id.clone();
        tracing::info!(session_id = %id, rounds, "workout started");
        self.sessions.push(session);
        self.persist();
        id
    }

    /// Mark a session completed. Unknown ids and sessions that are already
    /// completed are left untouched.
    pub fn complete_workout(&mut self, session_id: &str, duration_minutes: u64) {
        let index = match self.position(session_id) {
            Ok(index) => index,
            Err(e) => {
                tracing::debug!(error = %e, "complete ignored");
                return;
            }
        };
        let session = &mut self.sessions[index];
        if session.completed {
            tracing::debug!(session_id, "workout already completed");
            return;
        }
        session.completed = true;
        session.duration_minutes = duration_minutes;
        tracing::info!(session_id, duration_minutes, "workout completed");
        self.persist();
    }

    /// Remove an in-progress session. Completed sessions are history and
    /// stay; unknown ids are ignored.
    pub fn cancel_workout(&mut self, session_id: &str) {
        let index = match self.position(session_id) {
            Ok(index) => index,
            Err(e) => {
                tracing::debug!(error = %e, "cancel ignored");
                return;
            }
        };
        if self.sessions[index].completed {
            tracing::debug!(session_id, "completed workout cannot be cancelled");
            return;
        }
        self.sessions.remove(index);
        tracing::info!(session_id, "workout cancelled");
        self.persist();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn position(&self, session_id: &str) -> Result<usize> {
        self.sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| CoreError::UnknownSessionId(session_id.to_string()))
    }

    /// Recompute stats from scratch and save both blobs.
    fn persist(&mut self) {
        self.stats = compute_stats(&self.sessions, self.clock.today());
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "workout history not saved, keeping it in memory");
        }
    }

    fn save(&self) -> Result<()> {
        self.store
            .save(SESSIONS_KEY, &serde_json::to_string(&self.sessions)?)?;
        self.store
            .save(STATS_KEY, &serde_json::to_string(&self.stats)?)?;
        Ok(())
    }
}
