use emom_core::WorkRestSplit;
use serde::Serialize;

#[derive(Serialize)]
struct SplitRow {
    id: &'static str,
    work_seconds: u32,
    rest_seconds: u32,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let rows: Vec<SplitRow> = WorkRestSplit::all()
        .into_iter()
        .map(|split| {
            let durations = split.durations();
            SplitRow {
                id: split.id(),
                work_seconds: durations.work_seconds,
                rest_seconds: durations.rest_seconds,
            }
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
