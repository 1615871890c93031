use crate::domain::entities::SyncReport;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcomeStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_passes: u64,
    pub total_processed: u64,
    pub total_failed: u64,
    pub total_dead_lettered: u64,
    pub consecutive_failure: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<PassOutcomeStatus>,
    pub last_trigger: Option<String>,
    pub last_duration_ms: Option<u64>,
    pub last_remaining: Option<u32>,
}

#[derive(Default, Clone)]
struct LastPassMetadata {
    last_outcome: Option<PassOutcomeStatus>,
    trigger: Option<String>,
    duration_ms: Option<u64>,
    remaining: Option<u32>,
}

/// Counters over drain passes. A pass with at least one failed task counts
/// as a failure; empty passes are not recorded.
pub struct SyncMetrics {
    passes: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    dead_lettered: AtomicU64,
    consecutive_failure: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    metadata: Mutex<LastPassMetadata>,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dead_lettered: AtomicU64::new(0),
            consecutive_failure: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            metadata: Mutex::new(LastPassMetadata::default()),
        }
    }

    pub fn record_pass(&self, report: &SyncReport, trigger: Option<&str>) -> SyncMetricsSnapshot {
        if report.is_empty() {
            return self.snapshot();
        }

        self.passes.fetch_add(1, Ordering::Relaxed);
        self.processed
            .fetch_add(u64::from(report.processed_count), Ordering::Relaxed);
        self.failed
            .fetch_add(u64::from(report.failed_count), Ordering::Relaxed);
        self.dead_lettered
            .fetch_add(u64::from(report.dead_lettered_count), Ordering::Relaxed);

        let status = if report.has_failures() {
            self.last_failure_ms
                .store(current_unix_ms(), Ordering::Relaxed);
            self.consecutive_failure.fetch_add(1, Ordering::Relaxed);
            PassOutcomeStatus::Failure
        } else {
            self.last_success_ms
                .store(current_unix_ms(), Ordering::Relaxed);
            self.consecutive_failure.store(0, Ordering::Relaxed);
            PassOutcomeStatus::Success
        };

        let duration_ms = (report.finished_at - report.started_at)
            .num_milliseconds()
            .max(0) as u64;

        if let Ok(mut guard) = self.metadata.lock() {
            guard.last_outcome = Some(status);
            guard.trigger = trigger.map(str::to_string);
            guard.duration_ms = Some(duration_ms);
            guard.remaining = Some(report.remaining_count);
        }

        self.snapshot()
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        SyncMetricsSnapshot {
            total_passes: self.passes.load(Ordering::Relaxed),
            total_processed: self.processed.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            total_dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            consecutive_failure: self.consecutive_failure.load(Ordering::Relaxed),
            last_success_ms: to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: metadata.last_outcome,
            last_trigger: metadata.trigger,
            last_duration_ms: metadata.duration_ms,
            last_remaining: metadata.remaining,
        }
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 { None } else { Some(value) }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
