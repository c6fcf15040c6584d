//! Named work/rest splits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Work seconds used when a split id is not recognised.
pub const FALLBACK_WORK_SECONDS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkRestSplit {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "30-30")]
    ThirtyThirty,
    #[serde(rename = "40-20")]
    FortyTwenty,
    #[serde(rename = "45-15")]
    FortyFiveFifteen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDurations {
    pub work_seconds: u32,
    pub rest_seconds: u32,
}

impl WorkRestSplit {
    pub fn all() -> [WorkRestSplit; 4] {
        [
            WorkRestSplit::None,
            WorkRestSplit::ThirtyThirty,
            WorkRestSplit::FortyTwenty,
            WorkRestSplit::FortyFiveFifteen,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            WorkRestSplit::None => "none",
            WorkRestSplit::ThirtyThirty => "30-30",
            WorkRestSplit::FortyTwenty => "40-20",
            WorkRestSplit::FortyFiveFifteen => "45-15",
        }
    }

    pub fn durations(&self) -> SplitDurations {
        let (work_seconds, rest_seconds) = match self {
            WorkRestSplit::None => (FALLBACK_WORK_SECONDS, 0),
            WorkRestSplit::ThirtyThirty => (30, 30),
            WorkRestSplit::FortyTwenty => (40, 20),
            WorkRestSplit::FortyFiveFifteen => (45, 15),
        };
        SplitDurations {
            work_seconds,
            rest_seconds,
        }
    }
}

impl fmt::Display for WorkRestSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for WorkRestSplit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['|', '/'], "-");
        WorkRestSplit::all()
            .into_iter()
            .find(|split| split.id() == normalized)
            .ok_or_else(|| format!("unknown split: {s}"))
    }
}

/// Resolve a split id to its durations.
///
/// Unknown ids resolve to `{60, 0}` so an engine is never built without a
/// work duration.
pub fn resolve_split(split_id: &str) -> SplitDurations {
    match split_id.parse::<WorkRestSplit>() {
        Ok(split) => split.durations(),
        Err(_) => {
            tracing::warn!(split_id, "unknown split id, using default 60/0");
            SplitDurations {
                work_seconds: FALLBACK_WORK_SECONDS,
                rest_seconds: 0,
            }
        }
    }
}
