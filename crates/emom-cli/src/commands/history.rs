use emom_core::storage::Database;
use emom_core::{SystemClock, WorkoutLedger, WorkoutSession};

pub fn run(all: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = WorkoutLedger::open(Database::open()?, SystemClock);
    let sessions: Vec<&WorkoutSession> = if all {
        ledger.sessions().iter().collect()
    } else {
        ledger.completed_sessions().collect()
    };
    println!("{}", serde_json::to_string_pretty(&sessions)?);
    Ok(())
}
