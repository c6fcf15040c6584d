//! Integration tests for the workout history ledger.
//!
//! Covers the day streak across real calendar days, persistence through
//! SQLite, and the in-memory fallback when the store keeps failing.

use chrono::{DateTime, Local, TimeZone, Utc};
use emom_core::error::{PersistenceError, Result};
use emom_core::history::{SESSIONS_KEY, STATS_KEY};
use emom_core::{Database, KeyValueStore, ManualClock, MemoryStore, WorkoutLedger};

const DAY_SECS: u64 = 24 * 60 * 60;

/// Local noon, so whole-day steps never cross midnight through DST.
fn local_noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(y, m, d, 12, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn complete_one(ledger: &mut WorkoutLedger<impl KeyValueStore, ManualClock>, minutes: u64) {
    let id = ledger.start_workout(10);
    ledger.complete_workout(&id, minutes);
}

struct FailingStore;

impl KeyValueStore for FailingStore {
    fn load(&self, _key: &str) -> Result<Option<String>> {
        Err(PersistenceError::Unavailable("read refused".into()).into())
    }

    fn save(&self, _key: &str, _blob: &str) -> Result<()> {
        Err(PersistenceError::Unavailable("write refused".into()).into())
    }
}

#[test]
fn streak_counts_today_and_yesterday() {
    let clock = ManualClock::new(local_noon(2024, 5, 9));
    let mut ledger = WorkoutLedger::open(MemoryStore::new(), clock.clone());
    complete_one(&mut ledger, 10);

    clock.advance_secs(DAY_SECS);
    complete_one(&mut ledger, 12);

    let stats = ledger.stats();
    assert_eq!(stats.streak_days, 2);
    assert_eq!(stats.total_workouts, 2);
    assert_eq!(stats.total_time_minutes, 22);
}

#[test]
fn streak_is_zero_after_a_gap_day() {
    let clock = ManualClock::new(local_noon(2024, 5, 8));
    let mut ledger = WorkoutLedger::open(MemoryStore::new(), clock.clone());
    complete_one(&mut ledger, 10);

    clock.advance_secs(2 * DAY_SECS);
    let stats = ledger.refresh_stats();
    assert_eq!(stats.streak_days, 0);
    assert_eq!(stats.total_workouts, 1);
}

#[test]
fn in_progress_sessions_do_not_extend_streak() {
    let clock = ManualClock::new(local_noon(2024, 5, 9));
    let mut ledger = WorkoutLedger::open(MemoryStore::new(), clock.clone());
    complete_one(&mut ledger, 10);
    clock.advance_secs(DAY_SECS);
    ledger.start_workout(10);
    assert_eq!(ledger.stats().streak_days, 0);
}

#[test]
fn cancel_leaves_totals_unchanged() {
    let mut ledger = WorkoutLedger::open(MemoryStore::new(), ManualClock::default());
    complete_one(&mut ledger, 15);
    let before = ledger.stats();

    let id = ledger.start_workout(20);
    ledger.cancel_workout(&id);

    assert_eq!(ledger.stats(), before);
    assert!(ledger.session(&id).is_none());
    assert_eq!(ledger.sessions().len(), 1);
}

#[test]
fn completing_twice_does_not_double_count() {
    let mut ledger = WorkoutLedger::open(MemoryStore::new(), ManualClock::default());
    let id = ledger.start_workout(10);
    ledger.complete_workout(&id, 10);
    let once = ledger.stats();
    ledger.complete_workout(&id, 10);
    assert_eq!(ledger.stats(), once);
    assert_eq!(once.total_workouts, 1);
}

#[test]
fn history_survives_reopen_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("emom.db");
    let clock = ManualClock::new(local_noon(2024, 6, 1));

    let kept = {
        let mut ledger = WorkoutLedger::open(Database::open_at(&path).unwrap(), clock.clone());
        let kept = ledger.start_workout(12);
        ledger.complete_workout(&kept, 12);
        let dropped = ledger.start_workout(5);
        ledger.cancel_workout(&dropped);
        kept
    };

    let db = Database::open_at(&path).unwrap();
    assert!(db.load(STATS_KEY).unwrap().is_some());
    let ledger = WorkoutLedger::open(db, clock);
    assert_eq!(ledger.sessions().len(), 1);
    assert_eq!(ledger.sessions()[0].id, kept);
    assert_eq!(ledger.stats().total_time_minutes, 12);
    assert_eq!(ledger.stats().streak_days, 1);
}

#[test]
fn failing_store_keeps_ledger_in_memory() {
    let mut ledger = WorkoutLedger::open(FailingStore, ManualClock::default());
    let id = ledger.start_workout(8);
    ledger.complete_workout(&id, 8);
    let other = ledger.start_workout(3);
    ledger.cancel_workout(&other);

    assert_eq!(ledger.sessions().len(), 1);
    assert_eq!(ledger.stats().total_workouts, 1);
    assert_eq!(ledger.stats().total_time_minutes, 8);
}

#[test]
fn next_successful_save_reconciles_store() {
    let store = MemoryStore::new();
    store.save(SESSIONS_KEY, "garbage").unwrap();
    let mut ledger = WorkoutLedger::open(&store, ManualClock::default());
    complete_one(&mut ledger, 4);

    let reopened = WorkoutLedger::open(&store, ManualClock::default());
    assert_eq!(reopened.sessions(), ledger.sessions());
}
