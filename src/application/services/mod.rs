pub mod sync_coordinator;
pub mod sync_processor;
pub mod task_queue_service;
pub mod undo_service;

pub use sync_coordinator::{SyncCoordinator, SyncStatus, TriggerOutcome, TriggerReason};
pub use sync_processor::SyncProcessor;
pub use task_queue_service::{TaskQueueService, TaskQueueServiceTrait};
pub use undo_service::UndoService;
