use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable string storage the task store is persisted into.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Applies every write atomically; `None` removes the key.
    async fn write_batch(&self, entries: Vec<(String, Option<String>)>) -> Result<(), AppError>;

    async fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        self.write_batch(vec![(key.to_string(), Some(value))]).await
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.write_batch(vec![(key.to_string(), None)]).await
    }
}
