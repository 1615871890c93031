pub mod database;
pub mod metrics;
pub mod network;
pub mod remote;
pub mod storage;

pub use database::ConnectionPool;
pub use metrics::{SyncMetrics, SyncMetricsSnapshot};
pub use network::NetworkState;
pub use remote::InMemoryRemoteGateway;
pub use storage::{MemoryKeyValueStore, SqliteKeyValueStore, TaskStore};
