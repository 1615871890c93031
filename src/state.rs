use crate::application::handlers::HandlerRegistry;
use crate::application::ports::{Connectivity, KeyValueStore, RemoteGateway, SyncEventEmitter};
use crate::application::services::{
    SyncCoordinator, SyncProcessor, TaskQueueService, UndoService,
};
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::metrics::SyncMetrics;
use crate::infrastructure::network::NetworkState;
use crate::infrastructure::storage::{SqliteKeyValueStore, TaskStore};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Process-wide wiring of the queue, processor, coordinator and services.
pub struct AppState {
    pub config: AppConfig,
    pub pool: ConnectionPool,
    pub store: Arc<TaskStore>,
    pub metrics: Arc<SyncMetrics>,
    pub network: Arc<NetworkState>,
    pub processor: Arc<SyncProcessor>,
    pub coordinator: Arc<SyncCoordinator>,
    pub task_queue: Arc<TaskQueueService>,
    pub undo_service: Arc<UndoService>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl AppState {
    pub async fn new(
        config: AppConfig,
        gateway: Arc<dyn RemoteGateway>,
        network: Arc<NetworkState>,
        event_emitter: Option<Arc<dyn SyncEventEmitter>>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        ensure_database_dir(&config.database.url)?;
        let pool = ConnectionPool::from_config(&config.database).await?;
        pool.migrate().await?;

        let storage: Arc<dyn KeyValueStore> =
            Arc::new(SqliteKeyValueStore::new(pool.get_pool().clone()));
        let store = Arc::new(TaskStore::new(storage));
        let metrics = Arc::new(SyncMetrics::new());

        let mut processor = SyncProcessor::new(
            Arc::clone(&store),
            HandlerRegistry::with_defaults(),
            Arc::clone(&gateway),
            config.sync.clone(),
        )
        .with_metrics(Arc::clone(&metrics));
        if let Some(emitter) = event_emitter {
            processor = processor.with_event_emitter(emitter);
        }
        let processor = Arc::new(processor);
        let coordinator = Arc::new(SyncCoordinator::new(Arc::clone(&processor)));

        let connectivity: Arc<dyn Connectivity> = network.clone();
        let mut task_queue = TaskQueueService::new(Arc::clone(&store));
        if config.sync.auto_sync {
            task_queue = task_queue.with_auto_sync(Arc::clone(&coordinator), connectivity.clone());
        }

        let undo_service = Arc::new(UndoService::new(
            Arc::clone(&store),
            gateway,
            connectivity,
            config.undo.clone(),
            &config.sync,
        ));

        tracing::info!(
            target: "sync::state",
            database_url = %config.database.url,
            auto_sync = config.sync.auto_sync,
            "attendance sync initialized"
        );

        Ok(Self {
            config,
            pool,
            store,
            metrics,
            network,
            processor,
            coordinator,
            task_queue: Arc::new(task_queue),
            undo_service,
            background: Mutex::new(Vec::new()),
        })
    }

    /// Starts the network listener and, when auto sync is on, the periodic
    /// pass. Calling it again replaces the running tasks.
    pub async fn start_background(&self) {
        let mut background = self.background.lock().await;
        for handle in background.drain(..) {
            handle.abort();
        }

        background.push(self.coordinator.watch_network(self.network.subscribe()));
        if self.config.sync.auto_sync {
            background.push(self.coordinator.schedule(self.config.sync.sync_interval()));
        }
    }

    pub async fn shutdown(&self) {
        let mut background = self.background.lock().await;
        for handle in background.drain(..) {
            handle.abort();
        }
        self.pool.close().await;
    }
}

/// Creates the parent directory of a file-backed SQLite URL.
fn ensure_database_dir(url: &str) -> Result<(), AppError> {
    let Some(path) = sqlite_file_path(url) else {
        return Ok(());
    };
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| {
            AppError::Storage(format!(
                "Failed to create database directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

fn sqlite_file_path(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(path)
    }
}
