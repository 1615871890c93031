use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of mutation carried by a task.
///
/// Types written by a newer client deserialize into `Unknown` and keep their
/// original spelling so they can be written back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    AttendanceWrite,
    NotificationWrite,
    UndoAttendanceScan,
    Unknown(String),
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::AttendanceWrite => "attendance_write",
            TaskType::NotificationWrite => "notification_write",
            TaskType::UndoAttendanceScan => "undo_attendance_scan",
            TaskType::Unknown(value) => value.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TaskType::Unknown(_))
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for TaskType {
    fn from(value: &str) -> Self {
        match value {
            "attendance_write" | "AttendanceWrite" => TaskType::AttendanceWrite,
            "notification_write" | "NotificationWrite" => TaskType::NotificationWrite,
            "undo_attendance_scan" | "UndoAttendanceScan" => TaskType::UndoAttendanceScan,
            other => TaskType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        match TaskType::from(value.as_str()) {
            TaskType::Unknown(_) => TaskType::Unknown(value),
            known => known,
        }
    }
}

impl From<TaskType> for String {
    fn from(kind: TaskType) -> Self {
        match kind {
            TaskType::Unknown(value) => value,
            known => known.as_str().to_string(),
        }
    }
}
