use crate::application::ports::KeyValueStore;
use crate::domain::entities::{DeadLetter, QueuedTask, Task};
use crate::domain::value_objects::TaskId;
use crate::shared::error::AppError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const QUEUE_KEY: &str = "sync_queue";
pub const DEAD_LETTER_KEY: &str = "sync_dead_letters";

/// End-of-pass write produced by the sync processor.
#[derive(Debug, Clone, Default)]
pub struct PassCommit {
    /// Ids of every entry the pass took from its snapshot.
    pub attempted: HashSet<TaskId>,
    /// Entries to keep, in their original FIFO order.
    pub retained: Vec<QueuedTask>,
    pub dead_lettered: Vec<DeadLetter>,
}

/// Durable FIFO of pending tasks, persisted as one JSON array under a single
/// storage key. Every mutation rewrites the whole array, so the stored value
/// is always a complete snapshot.
///
/// Writes are serialized through one lock; a single process owns the store.
pub struct TaskStore {
    storage: Arc<dyn KeyValueStore>,
    writer: Mutex<()>,
}

impl TaskStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            writer: Mutex::new(()),
        }
    }

    /// Appends `task` to the tail of the queue. Returns only after the new
    /// snapshot is persisted; on error nothing was written.
    pub async fn enqueue(&self, task: Task) -> Result<QueuedTask, AppError> {
        let _guard = self.writer.lock().await;
        let mut queue = self.load_queue().await?;

        if let Some(existing) = queue.iter().find(|entry| entry.id() == &task.id) {
            tracing::debug!(
                target: "sync::store",
                task_id = %task.id,
                "task already queued, skipping duplicate enqueue"
            );
            return Ok(existing.clone());
        }

        let entry = QueuedTask::new(task);
        queue.push(entry.clone());
        self.storage.set(QUEUE_KEY, encode(&queue)?).await?;

        tracing::debug!(
            target: "sync::store",
            task_id = %entry.id(),
            task_type = %entry.task_type(),
            queue_len = queue.len(),
            "task enqueued"
        );
        Ok(entry)
    }

    /// Snapshot of every pending entry in FIFO order.
    ///
    /// Entries persisted without an `id` get one here and the snapshot is
    /// written back, so the ids a pass sees are the ids `commit_pass` reloads.
    pub async fn drain(&self) -> Result<Vec<QueuedTask>, AppError> {
        let _guard = self.writer.lock().await;
        let Some(raw) = self.storage.get(QUEUE_KEY).await? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<serde_json::Value> = decode(QUEUE_KEY, &raw)?;
        let missing_ids = entries
            .iter()
            .filter(|entry| entry.get("id").is_none())
            .count();
        let queue: Vec<QueuedTask> = serde_json::from_value(serde_json::Value::Array(entries))
            .map_err(|err| corrupt(QUEUE_KEY, err))?;

        if missing_ids > 0 {
            self.write_queue(&queue).await?;
            tracing::info!(
                target: "sync::store",
                count = missing_ids,
                "assigned ids to queued entries stored without one"
            );
        }
        Ok(queue)
    }

    /// Overwrites the queue with exactly `remaining`.
    pub async fn replace(&self, remaining: Vec<QueuedTask>) -> Result<(), AppError> {
        let _guard = self.writer.lock().await;
        self.write_queue(&remaining).await
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        let _guard = self.writer.lock().await;
        self.storage.remove(QUEUE_KEY).await
    }

    pub async fn len(&self) -> Result<usize, AppError> {
        Ok(self.load_queue().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.len().await? == 0)
    }

    /// Writes the outcome of a drain pass in one atomic batch.
    ///
    /// Entries enqueued while the pass was running (ids not in
    /// `commit.attempted`) are kept behind the retained ones. Returns the
    /// resulting queue length.
    pub async fn commit_pass(&self, commit: PassCommit) -> Result<usize, AppError> {
        let _guard = self.writer.lock().await;

        let current = self.load_queue().await?;
        let mut queue = commit.retained;
        queue.extend(
            current
                .into_iter()
                .filter(|entry| !commit.attempted.contains(entry.id())),
        );

        let mut batch = vec![(QUEUE_KEY.to_string(), queue_value(&queue)?)];
        if !commit.dead_lettered.is_empty() {
            let mut dead = self.load_dead_letters().await?;
            dead.extend(commit.dead_lettered);
            batch.push((DEAD_LETTER_KEY.to_string(), Some(encode(&dead)?)));
        }

        self.storage.write_batch(batch).await?;
        Ok(queue.len())
    }

    pub async fn dead_letters(&self) -> Result<Vec<DeadLetter>, AppError> {
        self.load_dead_letters().await
    }

    /// Moves every dead letter back to the tail of the queue with a fresh
    /// attempt counter.
    pub async fn requeue_dead_letters(&self) -> Result<usize, AppError> {
        let _guard = self.writer.lock().await;

        let dead = self.load_dead_letters().await?;
        if dead.is_empty() {
            return Ok(0);
        }
        let count = dead.len();

        let mut queue = self.load_queue().await?;
        let queued_ids: HashSet<TaskId> = queue.iter().map(|entry| entry.id().clone()).collect();
        queue.extend(
            dead.into_iter()
                .map(DeadLetter::into_requeued)
                .filter(|entry| !queued_ids.contains(entry.id())),
        );

        self.storage
            .write_batch(vec![
                (QUEUE_KEY.to_string(), queue_value(&queue)?),
                (DEAD_LETTER_KEY.to_string(), None),
            ])
            .await?;

        tracing::info!(target: "sync::store", count, "dead letters requeued");
        Ok(count)
    }

    pub async fn purge_dead_letters(&self) -> Result<usize, AppError> {
        let _guard = self.writer.lock().await;
        let count = self.load_dead_letters().await?.len();
        self.storage.remove(DEAD_LETTER_KEY).await?;
        Ok(count)
    }

    async fn write_queue(&self, queue: &[QueuedTask]) -> Result<(), AppError> {
        self.storage
            .write_batch(vec![(QUEUE_KEY.to_string(), queue_value(queue)?)])
            .await
    }

    async fn load_queue(&self) -> Result<Vec<QueuedTask>, AppError> {
        self.load(QUEUE_KEY).await
    }

    async fn load_dead_letters(&self) -> Result<Vec<DeadLetter>, AppError> {
        self.load(DEAD_LETTER_KEY).await
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, AppError> {
        match self.storage.get(key).await? {
            Some(raw) if !raw.trim().is_empty() => decode(key, &raw),
            _ => Ok(Vec::new()),
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<Vec<T>, AppError> {
    serde_json::from_str(raw).map_err(|err| corrupt(key, err))
}

fn corrupt(key: &str, err: serde_json::Error) -> AppError {
    AppError::DeserializationError(format!("Corrupt `{key}` snapshot: {err}"))
}

fn encode<T: Serialize>(items: &[T]) -> Result<String, AppError> {
    serde_json::to_string(items).map_err(|err| AppError::SerializationError(err.to_string()))
}

/// An empty queue removes the key rather than storing `[]`.
fn queue_value(queue: &[QueuedTask]) -> Result<Option<String>, AppError> {
    if queue.is_empty() {
        Ok(None)
    } else {
        encode(queue).map(Some)
    }
}
