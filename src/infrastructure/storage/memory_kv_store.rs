use crate::application::ports::KeyValueStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Process-local `KeyValueStore` for hosts without a disk and for tests.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail until switched off again.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write_batch(&self, batch: Vec<(String, Option<String>)>) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("memory store is read-only".to_string()));
        }

        let mut entries = self.entries.write().await;
        for (key, value) in batch {
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}
