pub mod attendance_write;
pub mod notification_write;
pub mod undo_attendance_scan;

use crate::application::ports::RemoteGateway;
use crate::domain::value_objects::{TaskPayload, TaskType};
use crate::shared::error::TaskError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub use attendance_write::AttendanceWriteHandler;
pub use notification_write::NotificationWriteHandler;
pub use undo_attendance_scan::UndoAttendanceScanHandler;

/// Applies one task type against the remote store.
///
/// Implementations must be idempotent: re-running with the same payload
/// after a partial failure converges to the same end state and never fails
/// just because earlier work already happened.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(
        &self,
        payload: &TaskPayload,
        gateway: &dyn RemoteGateway,
    ) -> Result<(), TaskError>;
}

/// Dispatch table from task type to handler. Types without an entry are
/// parked by the processor, never dropped.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in handlers for every known task type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TaskType::AttendanceWrite, Arc::new(AttendanceWriteHandler));
        registry.register(
            TaskType::NotificationWrite,
            Arc::new(NotificationWriteHandler),
        );
        registry.register(
            TaskType::UndoAttendanceScan,
            Arc::new(UndoAttendanceScanHandler),
        );
        registry
    }

    /// Registers (or replaces) the handler for `task_type`.
    pub fn register(&mut self, task_type: TaskType, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(task_type, handler);
    }

    pub fn get(&self, task_type: &TaskType) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(task_type).cloned()
    }

    pub fn handles(&self, task_type: &TaskType) -> bool {
        self.handlers.contains_key(task_type)
    }
}

pub(crate) fn decode_payload<T: serde::de::DeserializeOwned>(
    payload: &TaskPayload,
) -> Result<T, TaskError> {
    payload.decode().map_err(TaskError::InvalidPayload)
}
