use super::sync_coordinator::{SyncCoordinator, TriggerReason};
use crate::application::ports::Connectivity;
use crate::domain::entities::{DeadLetter, QueuedTask, Task};
use crate::domain::value_objects::{TaskId, TaskPayload, TaskType};
use crate::infrastructure::storage::TaskStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

/// Enqueue surface consumed by UI collaborators.
#[async_trait]
pub trait TaskQueueServiceTrait: Send + Sync {
    async fn enqueue(&self, task_type: TaskType, payload: TaskPayload) -> Result<TaskId, AppError>;
    async fn get_queue(&self) -> Result<Vec<QueuedTask>, AppError>;
    async fn clear_queue(&self) -> Result<(), AppError>;
    async fn queue_length(&self) -> Result<usize, AppError>;
    async fn dead_letters(&self) -> Result<Vec<DeadLetter>, AppError>;
    async fn requeue_dead_letters(&self) -> Result<usize, AppError>;
    async fn purge_dead_letters(&self) -> Result<usize, AppError>;
}

pub struct TaskQueueService {
    store: Arc<TaskStore>,
    coordinator: Option<Arc<SyncCoordinator>>,
    connectivity: Option<Arc<dyn Connectivity>>,
}

impl TaskQueueService {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self {
            store,
            coordinator: None,
            connectivity: None,
        }
    }

    /// Kicks a background pass after every enqueue while online.
    pub fn with_auto_sync(
        mut self,
        coordinator: Arc<SyncCoordinator>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        self.coordinator = Some(coordinator);
        self.connectivity = Some(connectivity);
        self
    }

    async fn nudge(&self) {
        let Some(coordinator) = &self.coordinator else {
            return;
        };
        if let Some(connectivity) = &self.connectivity
            && !connectivity.is_online().await
        {
            return;
        }
        coordinator.trigger(TriggerReason::Enqueued);
    }
}

#[async_trait]
impl TaskQueueServiceTrait for TaskQueueService {
    async fn enqueue(&self, task_type: TaskType, payload: TaskPayload) -> Result<TaskId, AppError> {
        if !task_type.is_known() {
            tracing::warn!(
                target: "sync::store",
                task_type = %task_type,
                "enqueueing task of unknown type; it will be parked until a handler exists"
            );
        }
        let entry = self.store.enqueue(Task::new(task_type, payload)).await?;
        self.nudge().await;
        Ok(entry.id().clone())
    }

    async fn get_queue(&self) -> Result<Vec<QueuedTask>, AppError> {
        self.store.drain().await
    }

    async fn clear_queue(&self) -> Result<(), AppError> {
        self.store.clear().await
    }

    async fn queue_length(&self) -> Result<usize, AppError> {
        self.store.len().await
    }

    async fn dead_letters(&self) -> Result<Vec<DeadLetter>, AppError> {
        self.store.dead_letters().await
    }

    async fn requeue_dead_letters(&self) -> Result<usize, AppError> {
        let count = self.store.requeue_dead_letters().await?;
        if count > 0 {
            self.nudge().await;
        }
        Ok(count)
    }

    async fn purge_dead_letters(&self) -> Result<usize, AppError> {
        self.store.purge_dead_letters().await
    }
}
