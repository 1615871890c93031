pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::handlers::{HandlerRegistry, TaskHandler};
pub use application::ports::{Connectivity, KeyValueStore, RemoteGateway, SyncEventEmitter};
pub use application::services::{
    SyncCoordinator, SyncProcessor, SyncStatus, TaskQueueService, TaskQueueServiceTrait,
    TriggerOutcome, TriggerReason, UndoService,
};
pub use domain::entities::{
    CascadeReport, DeadLetter, QueuedTask, SyncReport, Task, UndoOutcome, UndoScanPayload,
    UndoScanRequest,
};
pub use domain::value_objects::{TaskId, TaskPayload, TaskType};
pub use infrastructure::{
    ConnectionPool, InMemoryRemoteGateway, MemoryKeyValueStore, NetworkState,
    SqliteKeyValueStore, SyncMetrics, SyncMetricsSnapshot, TaskStore,
};
pub use shared::{AppConfig, AppError, GatewayError, TaskError};
pub use state::AppState;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; a second call is a no-op.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attendance_sync=debug,sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
