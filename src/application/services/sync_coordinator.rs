use super::sync_processor::SyncProcessor;
use crate::domain::entities::SyncReport;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    NetworkRestored,
    AppForegrounded,
    Manual,
    Scheduled,
    Enqueued,
}

impl TriggerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerReason::NetworkRestored => "network_restored",
            TriggerReason::AppForegrounded => "app_foregrounded",
            TriggerReason::Manual => "manual",
            TriggerReason::Scheduled => "scheduled",
            TriggerReason::Enqueued => "enqueued",
        }
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// This call ran the pass (plus any coalesced rerun); carries the report
    /// of the last pass it ran.
    Started(SyncReport),
    /// A pass was already running; one rerun is scheduled behind it.
    Coalesced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub queue_length: usize,
    pub last_report: Option<SyncReport>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

#[derive(Default)]
struct CoordinatorState {
    running: bool,
    pending: Option<TriggerReason>,
    last_report: Option<SyncReport>,
    last_sync_at: Option<DateTime<Utc>>,
    consecutive_failures: u32,
}

impl CoordinatorState {
    fn record(&mut self, report: &SyncReport) {
        self.last_sync_at = Some(report.finished_at);
        if report.has_failures() {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        } else {
            self.consecutive_failures = 0;
        }
        self.last_report = Some(report.clone());
    }
}

/// Single entry point for every sync trigger.
///
/// At most one pass runs at a time. Triggers that arrive while a pass is in
/// flight collapse into a single pending rerun, which the running caller
/// executes before returning, also when the pass it was waiting on aborted.
pub struct SyncCoordinator {
    processor: Arc<SyncProcessor>,
    state: Mutex<CoordinatorState>,
}

impl SyncCoordinator {
    pub fn new(processor: Arc<SyncProcessor>) -> Self {
        Self {
            processor,
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    pub fn processor(&self) -> &Arc<SyncProcessor> {
        &self.processor
    }

    pub async fn trigger_sync(&self, reason: TriggerReason) -> Result<TriggerOutcome, AppError> {
        {
            let mut state = self.state.lock().await;
            if state.running {
                state.pending = Some(reason);
                tracing::debug!(
                    target: "sync::coordinator",
                    reason = %reason,
                    "sync already running, coalescing trigger"
                );
                return Ok(TriggerOutcome::Coalesced);
            }
            state.running = true;
        }

        let mut reason = reason;
        loop {
            let result = self
                .processor
                .run_pass_with_trigger(Some(reason.as_str()))
                .await;

            let mut state = self.state.lock().await;
            match result {
                Ok(report) => {
                    state.record(&report);
                    if let Some(next) = state.pending.take() {
                        tracing::debug!(
                            target: "sync::coordinator",
                            reason = %next,
                            "running coalesced sync pass"
                        );
                        reason = next;
                        continue;
                    }
                    state.running = false;
                    return Ok(TriggerOutcome::Started(report));
                }
                Err(err) => {
                    state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                    tracing::error!(
                        target: "sync::coordinator",
                        reason = %reason,
                        error = %err,
                        "sync pass aborted"
                    );
                    if let Some(next) = state.pending.take() {
                        reason = next;
                        continue;
                    }
                    state.running = false;
                    return Err(err);
                }
            }
        }
    }

    /// Fire-and-forget variant of [`trigger_sync`](Self::trigger_sync).
    pub fn trigger(self: &Arc<Self>, reason: TriggerReason) {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.run_logged(reason).await;
        });
    }

    pub async fn status(&self) -> Result<SyncStatus, AppError> {
        let queue_length = self.processor.store().len().await?;
        let state = self.state.lock().await;
        Ok(SyncStatus {
            is_syncing: state.running,
            queue_length,
            last_report: state.last_report.clone(),
            last_sync_at: state.last_sync_at,
            consecutive_failures: state.consecutive_failures,
        })
    }

    /// Runs a pass every `interval` until the returned handle is aborted.
    pub fn schedule(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                coordinator.run_logged(TriggerReason::Scheduled).await;
            }
        })
    }

    /// Triggers a pass on every offline→online transition seen on `receiver`.
    /// The task ends when the sender is dropped.
    pub fn watch_network(self: &Arc<Self>, mut receiver: watch::Receiver<bool>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let mut was_online = *receiver.borrow_and_update();
        tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let online = *receiver.borrow_and_update();
                if online && !was_online {
                    tracing::info!(target: "sync::coordinator", "network restored");
                    coordinator.run_logged(TriggerReason::NetworkRestored).await;
                }
                was_online = online;
            }
        })
    }

    async fn run_logged(&self, reason: TriggerReason) {
        if let Err(err) = self.trigger_sync(reason).await {
            tracing::warn!(
                target: "sync::coordinator",
                reason = %reason,
                error = %err,
                "background sync failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::{HandlerRegistry, TaskHandler};
    use crate::application::ports::RemoteGateway;
    use crate::domain::entities::Task;
    use crate::domain::value_objects::{TaskPayload, TaskType};
    use crate::infrastructure::network::NetworkState;
    use crate::infrastructure::remote::InMemoryRemoteGateway;
    use crate::infrastructure::storage::{MemoryKeyValueStore, TaskStore};
    use crate::shared::config::SyncConfig;
    use crate::shared::error::TaskError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Blocks its first invocation until `release` is notified.
    #[derive(Default)]
    struct GatedHandler {
        started: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TaskHandler for GatedHandler {
        async fn handle(
            &self,
            _payload: &TaskPayload,
            _gateway: &dyn RemoteGateway,
        ) -> Result<(), TaskError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(())
        }
    }

    fn coordinator(handler: Arc<dyn TaskHandler>) -> Arc<SyncCoordinator> {
        let store = Arc::new(TaskStore::new(Arc::new(MemoryKeyValueStore::new())));
        let mut registry = HandlerRegistry::new();
        registry.register(TaskType::AttendanceWrite, handler);
        let processor = SyncProcessor::new(
            store,
            registry,
            Arc::new(InMemoryRemoteGateway::new()),
            SyncConfig::default(),
        );
        Arc::new(SyncCoordinator::new(Arc::new(processor)))
    }

    fn task() -> Task {
        Task::new(TaskType::AttendanceWrite, TaskPayload::default())
    }

    #[tokio::test]
    async fn overlapping_triggers_coalesce_into_one_rerun() {
        let handler = Arc::new(GatedHandler::default());
        let coordinator = coordinator(handler.clone());
        let store = coordinator.processor().store().clone();
        store.enqueue(task()).await.unwrap();

        let running = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.trigger_sync(TriggerReason::Manual).await })
        };
        handler.started.notified().await;

        // 実行中に追加されたタスクは次のパスで処理される
        store.enqueue(task()).await.unwrap();
        for reason in [TriggerReason::NetworkRestored, TriggerReason::AppForegrounded] {
            assert_eq!(
                coordinator.trigger_sync(reason).await.unwrap(),
                TriggerOutcome::Coalesced
            );
        }
        assert!(coordinator.status().await.unwrap().is_syncing);

        handler.release.notify_one();
        let outcome = running.await.unwrap().unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        match outcome {
            TriggerOutcome::Started(report) => assert_eq!(report.processed_count, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let status = coordinator.status().await.unwrap();
        assert!(!status.is_syncing);
        assert_eq!(status.queue_length, 0);
        assert!(status.last_sync_at.is_some());
        assert_eq!(status.consecutive_failures, 0);
    }

    /// Blocks its first call, then lifts the storage write failure on the
    /// next one.
    struct StorageRecoveringHandler {
        storage: Arc<MemoryKeyValueStore>,
        started: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TaskHandler for StorageRecoveringHandler {
        async fn handle(
            &self,
            _payload: &TaskPayload,
            _gateway: &dyn RemoteGateway,
        ) -> Result<(), TaskError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.started.notify_one();
                self.release.notified().await;
            } else {
                self.storage.fail_writes(false);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn coalesced_rerun_survives_an_aborted_pass() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = Arc::new(TaskStore::new(storage.clone()));
        store.enqueue(task()).await.unwrap();

        let handler = Arc::new(StorageRecoveringHandler {
            storage: storage.clone(),
            started: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let mut registry = HandlerRegistry::new();
        registry.register(TaskType::AttendanceWrite, handler.clone());
        let processor = SyncProcessor::new(
            store.clone(),
            registry,
            Arc::new(InMemoryRemoteGateway::new()),
            SyncConfig::default(),
        );
        let coordinator = Arc::new(SyncCoordinator::new(Arc::new(processor)));

        let running = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.trigger_sync(TriggerReason::Manual).await })
        };
        handler.started.notified().await;

        // 最初のパスのコミットは失敗する
        storage.fail_writes(true);
        assert_eq!(
            coordinator
                .trigger_sync(TriggerReason::NetworkRestored)
                .await
                .unwrap(),
            TriggerOutcome::Coalesced
        );
        handler.release.notify_one();

        let outcome = running.await.unwrap().unwrap();
        match outcome {
            TriggerOutcome::Started(report) => assert_eq!(report.processed_count, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty().await.unwrap());

        let status = coordinator.status().await.unwrap();
        assert!(!status.is_syncing);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn empty_queue_trigger_is_a_noop() {
        let coordinator = coordinator(Arc::new(GatedHandler::default()));

        let outcome = coordinator
            .trigger_sync(TriggerReason::Manual)
            .await
            .unwrap();

        assert!(matches!(outcome, TriggerOutcome::Started(ref report) if report.is_empty()));
    }

    #[tokio::test]
    async fn network_restore_drains_the_queue() {
        let handler = Arc::new(GatedHandler::default());
        handler.release.notify_one();
        let coordinator = coordinator(handler.clone());
        let store = coordinator.processor().store().clone();
        store.enqueue(task()).await.unwrap();

        let network = NetworkState::new(false);
        let watcher = coordinator.watch_network(network.subscribe());
        network.set_online(true);

        tokio::time::timeout(Duration::from_secs(2), async {
            while !store.is_empty().await.unwrap() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("queue should drain after reconnect");

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        watcher.abort();
    }

    #[tokio::test]
    async fn scheduled_passes_run_on_interval() {
        let handler = Arc::new(GatedHandler::default());
        handler.release.notify_one();
        let coordinator = coordinator(handler.clone());
        let store = coordinator.processor().store().clone();
        store.enqueue(task()).await.unwrap();

        let schedule = coordinator.schedule(Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(2), async {
            while !store.is_empty().await.unwrap() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("scheduled pass should drain the queue");

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        schedule.abort();
    }
}
