use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field map of one remote document.
pub type Document = Map<String, Value>;

/// Named remote collections touched by the task handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    AttendanceRecords,
    StudentAlerts,
    ParentAlerts,
    RelationshipLinks,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::AttendanceRecords => "attendance_records",
            Collection::StudentAlerts => "student_alerts",
            Collection::ParentAlerts => "parent_alerts",
            Collection::RelationshipLinks => "relationship_links",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a document inside a collection. Compound keys are joined with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn compound(parts: &[&str]) -> Self {
        Self(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads a string field, accepting numbers as their decimal form.
pub fn string_field(document: &Document, field: &str) -> Option<String> {
    match document.get(field)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}
