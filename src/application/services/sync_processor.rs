use crate::application::handlers::HandlerRegistry;
use crate::application::ports::{RemoteGateway, SyncEventEmitter};
use crate::domain::entities::{DeadLetter, PassStatus, QueuedTask, SyncReport};
use crate::infrastructure::metrics::SyncMetrics;
use crate::infrastructure::storage::{PassCommit, TaskStore};
use crate::shared::config::SyncConfig;
use crate::shared::error::{AppError, TaskError};
use chrono::Utc;
use std::sync::Arc;

enum TaskOutcome {
    Succeeded,
    Parked,
    Failed(TaskError),
}

/// Drains the task store once per call.
///
/// Tasks run sequentially in FIFO order and a failure never blocks the tasks
/// behind it. Handler errors stay inside the pass: they only decide whether
/// an entry is retained, dead-lettered or removed. Callers must not run two
/// passes at once; [`SyncCoordinator`](super::SyncCoordinator) enforces that.
pub struct SyncProcessor {
    store: Arc<TaskStore>,
    registry: HandlerRegistry,
    gateway: Arc<dyn RemoteGateway>,
    config: SyncConfig,
    metrics: Arc<SyncMetrics>,
    event_emitter: Option<Arc<dyn SyncEventEmitter>>,
}

impl SyncProcessor {
    pub fn new(
        store: Arc<TaskStore>,
        registry: HandlerRegistry,
        gateway: Arc<dyn RemoteGateway>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            registry,
            gateway,
            config,
            metrics: Arc::new(SyncMetrics::new()),
            event_emitter: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SyncMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_event_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.event_emitter = Some(emitter);
        self
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub async fn run_pass(&self) -> Result<SyncReport, AppError> {
        self.run_pass_with_trigger(None).await
    }

    /// Runs one pass; `trigger` is only recorded in metrics and logs.
    pub async fn run_pass_with_trigger(
        &self,
        trigger: Option<&str>,
    ) -> Result<SyncReport, AppError> {
        let started_at = Utc::now();
        let snapshot = self.store.drain().await?;

        if snapshot.is_empty() {
            tracing::debug!(target: "sync::processor", trigger, "queue empty, nothing to sync");
            return Ok(SyncReport::empty(started_at));
        }

        tracing::info!(
            target: "sync::processor",
            trigger,
            pending = snapshot.len(),
            "sync pass started"
        );

        let mut commit = PassCommit::default();
        let mut processed_count = 0u32;
        let mut failed_count = 0u32;
        let mut parked_count = 0u32;

        for entry in snapshot {
            commit.attempted.insert(entry.id().clone());

            match self.apply(&entry).await {
                TaskOutcome::Succeeded => {
                    processed_count += 1;
                    tracing::debug!(
                        target: "sync::processor",
                        task_id = %entry.id(),
                        task_type = %entry.task_type(),
                        "task applied"
                    );
                }
                TaskOutcome::Parked => {
                    parked_count += 1;
                    tracing::warn!(
                        target: "sync::processor",
                        task_id = %entry.id(),
                        task_type = %entry.task_type(),
                        "no handler for task type, parking"
                    );
                    commit.retained.push(entry);
                }
                TaskOutcome::Failed(error) => {
                    failed_count += 1;
                    self.settle_failure(entry, error, &mut commit);
                }
            }
        }

        let dead_lettered = commit.dead_lettered.clone();
        let remaining = self.store.commit_pass(commit).await?;

        let report = SyncReport {
            status: PassStatus::Completed,
            processed_count,
            failed_count,
            parked_count,
            dead_lettered_count: u32::try_from(dead_lettered.len()).unwrap_or(u32::MAX),
            remaining_count: u32::try_from(remaining).unwrap_or(u32::MAX),
            started_at,
            finished_at: Utc::now(),
        };

        self.metrics.record_pass(&report, trigger);
        self.emit(&report, &dead_lettered);

        tracing::info!(
            target: "sync::processor",
            trigger,
            processed = report.processed_count,
            failed = report.failed_count,
            parked = report.parked_count,
            dead_lettered = report.dead_lettered_count,
            remaining = report.remaining_count,
            "sync pass finished"
        );
        Ok(report)
    }

    async fn apply(&self, entry: &QueuedTask) -> TaskOutcome {
        let Some(handler) = self.registry.get(entry.task_type()) else {
            return TaskOutcome::Parked;
        };

        let run = handler.handle(&entry.task.payload, self.gateway.as_ref());
        match tokio::time::timeout(self.config.task_timeout(), run).await {
            Ok(Ok(())) => TaskOutcome::Succeeded,
            Ok(Err(error)) => TaskOutcome::Failed(error),
            Err(_) => TaskOutcome::Failed(TaskError::Timeout(self.config.task_timeout_ms)),
        }
    }

    fn settle_failure(&self, entry: QueuedTask, error: TaskError, commit: &mut PassCommit) {
        let message = error.to_string();
        let entry = entry.after_failure(message.clone());

        if error.is_permanent() || entry.attempts >= self.config.max_attempts {
            tracing::error!(
                target: "sync::processor",
                task_id = %entry.id(),
                task_type = %entry.task_type(),
                attempts = entry.attempts,
                error = %message,
                "task moved to dead letters"
            );
            commit.dead_lettered.push(DeadLetter::new(entry, message));
        } else {
            tracing::warn!(
                target: "sync::processor",
                task_id = %entry.id(),
                task_type = %entry.task_type(),
                attempts = entry.attempts,
                error = %message,
                "task failed, retained for next pass"
            );
            commit.retained.push(entry);
        }
    }

    fn emit(&self, report: &SyncReport, dead_lettered: &[DeadLetter]) {
        let Some(emitter) = &self.event_emitter else {
            return;
        };
        for dead_letter in dead_lettered {
            if let Err(err) = emitter.emit_dead_lettered(dead_letter) {
                tracing::warn!(
                    target: "sync::processor",
                    error = %err,
                    "failed to emit dead letter event"
                );
            }
        }
        if let Err(err) = emitter.emit_pass_completed(report) {
            tracing::warn!(target: "sync::processor", error = %err, "failed to emit pass report");
        }
    }
}
