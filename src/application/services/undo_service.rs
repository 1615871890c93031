use crate::application::handlers::UndoAttendanceScanHandler;
use crate::application::ports::{Connectivity, RemoteGateway};
use crate::domain::entities::{Task, UndoOutcome, UndoScanPayload, UndoScanRequest};
use crate::domain::value_objects::{TaskId, TaskType};
use crate::infrastructure::storage::TaskStore;
use crate::shared::config::{SyncConfig, UndoConfig};
use crate::shared::error::{AppError, TaskError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Interactive undo of a single attendance scan.
///
/// Online requests run the cascade inline and report the result directly;
/// offline requests go to the queue and are reported as queued, not done.
/// Inline failures are queued as well so the cascade still converges.
pub struct UndoService {
    store: Arc<TaskStore>,
    gateway: Arc<dyn RemoteGateway>,
    connectivity: Arc<dyn Connectivity>,
    handler: UndoAttendanceScanHandler,
    undo: UndoConfig,
    task_timeout_ms: u64,
}

impl UndoService {
    pub fn new(
        store: Arc<TaskStore>,
        gateway: Arc<dyn RemoteGateway>,
        connectivity: Arc<dyn Connectivity>,
        undo: UndoConfig,
        sync: &SyncConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            connectivity,
            handler: UndoAttendanceScanHandler,
            undo,
            task_timeout_ms: sync.task_timeout_ms,
        }
    }

    /// Time left to undo a scan taken at `scanned_at`, or `None` once the
    /// window has closed.
    pub fn remaining_window(
        &self,
        scanned_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let window = self.undo.eligibility_window();
        let elapsed = now - scanned_at;
        if elapsed > window || -elapsed > window {
            return None;
        }
        Some(window - elapsed.max(Duration::zero()))
    }

    pub async fn request_undo(
        &self,
        request: UndoScanRequest,
        now: DateTime<Utc>,
    ) -> Result<UndoOutcome, AppError> {
        let UndoScanRequest {
            payload,
            scanned_at,
        } = request;

        if self.remaining_window(scanned_at, now).is_none() {
            return Err(AppError::UndoIneligible(format!(
                "scan {} is outside the {}s undo window",
                payload.scan_id, self.undo.eligibility_window_secs
            )));
        }

        if !self.connectivity.is_online().await {
            let task_id = self.enqueue(&payload).await?;
            tracing::info!(
                target: "sync::undo",
                scan_id = %payload.scan_id,
                task_id = %task_id,
                "offline, undo queued"
            );
            return Ok(UndoOutcome::Queued { task_id });
        }

        let timeout = std::time::Duration::from_millis(self.task_timeout_ms);
        let result = match tokio::time::timeout(
            timeout,
            self.handler.run(&payload, self.gateway.as_ref()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TaskError::Timeout(self.task_timeout_ms)),
        };

        match result {
            Ok(report) => Ok(UndoOutcome::Completed(report)),
            Err(error) => {
                let task_id = self.enqueue(&payload).await?;
                tracing::warn!(
                    target: "sync::undo",
                    scan_id = %payload.scan_id,
                    task_id = %task_id,
                    error = %error,
                    "inline undo failed, queued for retry"
                );
                Ok(UndoOutcome::Failed {
                    error: error.to_string(),
                    task_id,
                })
            }
        }
    }

    async fn enqueue(&self, payload: &UndoScanPayload) -> Result<TaskId, AppError> {
        let payload = payload
            .to_payload()
            .map_err(AppError::SerializationError)?;
        let entry = self
            .store
            .enqueue(Task::new(TaskType::UndoAttendanceScan, payload))
            .await?;
        Ok(entry.id().clone())
    }
}
