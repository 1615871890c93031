use crate::domain::value_objects::{TaskId, TaskPayload, TaskType};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A pending mutation. Immutable once created; the queue only ever removes
/// or retains it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: TaskId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub payload: TaskPayload,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub enqueued_at: DateTime<Utc>,
}

impl Task {
    pub fn new(task_type: TaskType, payload: TaskPayload) -> Self {
        Self::with_timestamp(task_type, payload, Utc::now())
    }

    /// `enqueued_at` is truncated to the millisecond precision it is stored
    /// with.
    pub fn with_timestamp(
        task_type: TaskType,
        payload: TaskPayload,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            task_type,
            payload,
            enqueued_at: enqueued_at.trunc_subsecs(3),
        }
    }
}

/// Queue entry: the task plus its retry bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedTask {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.task.id
    }

    pub fn task_type(&self) -> &TaskType {
        &self.task.task_type
    }

    /// Returns the entry to keep after a failed attempt.
    pub fn after_failure(mut self, error: impl Into<String>) -> Self {
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(error.into());
        self
    }
}

/// A task that exhausted its attempts (or can never succeed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    #[serde(flatten)]
    pub entry: QueuedTask,
    pub reason: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub dead_lettered_at: DateTime<Utc>,
}

impl DeadLetter {
    pub fn new(entry: QueuedTask, reason: impl Into<String>) -> Self {
        Self {
            entry,
            reason: reason.into(),
            dead_lettered_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Fresh queue entry for a manual retry; the attempt counter restarts.
    pub fn into_requeued(self) -> QueuedTask {
        QueuedTask::new(self.entry.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_entries_without_id_or_attempts_still_load() {
        let raw = json!({
            "type": "UndoAttendanceScan",
            "payload": {"scanId": "s1", "studentId": "ST-001", "uid": "u1"},
            "enqueuedAt": 1_700_000_000_000i64
        });

        let entry: QueuedTask = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.attempts, 0);
        assert!(entry.last_error.is_none());
        assert_eq!(entry.task.task_type, TaskType::UndoAttendanceScan);
        assert!(!entry.id().as_str().is_empty());
        assert_eq!(entry.task.enqueued_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn failure_bumps_attempts_without_touching_the_task() {
        let task = Task::new(
            TaskType::AttendanceWrite,
            TaskPayload::from_json_str(r#"{"scanId":"s1"}"#).unwrap(),
        );
        let entry = QueuedTask::new(task.clone()).after_failure("offline");

        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.last_error.as_deref(), Some("offline"));
        assert_eq!(entry.task, task);
    }

    #[test]
    fn stored_task_equals_the_created_one() {
        let task = Task::new(TaskType::AttendanceWrite, TaskPayload::default());

        let reloaded: Task = serde_json::from_value(serde_json::to_value(&task).unwrap()).unwrap();
        assert_eq!(reloaded, task);
        assert_eq!(task.enqueued_at.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn persisted_form_is_flat() {
        let task = Task::new(TaskType::NotificationWrite, TaskPayload::default());
        let value = serde_json::to_value(QueuedTask::new(task)).unwrap();

        assert_eq!(value["type"], "notification_write");
        assert!(value["enqueuedAt"].is_i64());
        assert_eq!(value["attempts"], 0);
        assert!(value.get("lastError").is_none());
    }
}
