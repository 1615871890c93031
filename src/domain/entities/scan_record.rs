use crate::domain::value_objects::{Document, DocumentKey, ScanId, StudentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanEntry {
    In,
    Out,
}

/// Canonical attendance event, keyed by `(studentId, scanId)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub student_id: StudentId,
    pub scan_id: ScanId,
    pub entry: ScanEntry,
    pub time_of_scanned: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanner_device_id: Option<String>,
}

impl ScanRecord {
    pub fn key(&self) -> DocumentKey {
        Self::key_for(&self.student_id, &self.scan_id)
    }

    pub fn key_for(student_id: &StudentId, scan_id: &ScanId) -> DocumentKey {
        DocumentKey::compound(&[student_id.as_str(), scan_id.as_str()])
    }

    /// Fields written to the attendance collection.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(Document::new()),
        }
    }
}
