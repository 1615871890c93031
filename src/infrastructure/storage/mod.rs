pub mod memory_kv_store;
pub mod sqlite_kv_store;
pub mod task_store;

pub use memory_kv_store::MemoryKeyValueStore;
pub use sqlite_kv_store::SqliteKeyValueStore;
pub use task_store::{DEAD_LETTER_KEY, PassCommit, QUEUE_KEY, TaskStore};
