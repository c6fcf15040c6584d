use emom_core::storage::Database;
use emom_core::{SystemClock, WorkoutLedger};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = WorkoutLedger::open(Database::open()?, SystemClock);
    println!("{}", serde_json::to_string_pretty(&ledger.stats())?);
    Ok(())
}
