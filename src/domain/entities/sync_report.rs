use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    /// The queue was empty when the pass started.
    Empty,
    Completed,
}

/// Aggregate result of one drain pass, the only thing the UI observes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub status: PassStatus,
    pub processed_count: u32,
    pub failed_count: u32,
    /// Unknown-type tasks passed through untouched.
    pub parked_count: u32,
    pub dead_lettered_count: u32,
    /// Queue length right after the pass was committed.
    pub remaining_count: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            status: PassStatus::Empty,
            processed_count: 0,
            failed_count: 0,
            parked_count: 0,
            dead_lettered_count: 0,
            remaining_count: 0,
            started_at: at,
            finished_at: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status == PassStatus::Empty
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }
}
