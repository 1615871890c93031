use super::cascade_report::CascadeReport;
use crate::domain::value_objects::{ActorUid, ScanId, StudentId, TaskId, TaskPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload of an `UndoAttendanceScan` task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoScanPayload {
    pub scan_id: ScanId,
    pub student_id: StudentId,
    #[serde(alias = "uid", default, skip_serializing_if = "Option::is_none")]
    pub actor_uid: Option<ActorUid>,
}

impl UndoScanPayload {
    pub fn to_payload(&self) -> Result<TaskPayload, String> {
        let value = serde_json::to_value(self).map_err(|e| e.to_string())?;
        TaskPayload::new(value)
    }

    /// Every identifier the student may be linked under.
    pub fn identities(&self) -> Vec<String> {
        let mut identities = vec![self.student_id.to_string()];
        if let Some(uid) = &self.actor_uid
            && uid.as_str() != self.student_id.as_str()
        {
            identities.push(uid.to_string());
        }
        identities
    }
}

/// Interactive undo request from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoScanRequest {
    pub payload: UndoScanPayload,
    /// When the scan being undone happened; drives the eligibility window.
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Ran inline while online and every cascade step succeeded.
    Completed(CascadeReport),
    /// Device is offline; the undo waits in the queue.
    Queued { task_id: TaskId },
    /// Ran inline but at least one step failed; queued for convergence.
    Failed { error: String, task_id: TaskId },
}

impl UndoOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, UndoOutcome::Completed(_))
    }
}
