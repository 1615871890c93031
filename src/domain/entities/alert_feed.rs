use crate::domain::value_objects::{Document, ScanId, StudentId, string_field};
use serde_json::Value;

pub const ATTENDANCE_SCAN_ALERT: &str = "attendance_scan";
pub const ITEMS_FIELD: &str = "items";

/// Compound key identifying one alert item inside any feed.
///
/// Feeds are shared across many events, so matching on `scanId` alone would
/// remove other students' alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMatch {
    pub item_type: String,
    pub scan_id: String,
    pub student_id: String,
}

impl AlertMatch {
    pub fn attendance_scan(scan_id: &ScanId, student_id: &StudentId) -> Self {
        Self {
            item_type: ATTENDANCE_SCAN_ALERT.to_string(),
            scan_id: scan_id.to_string(),
            student_id: student_id.to_string(),
        }
    }

    pub fn from_item(item: &Value) -> Option<Self> {
        let fields = item.as_object()?;
        Some(Self {
            item_type: string_field(fields, "type")?,
            scan_id: string_field(fields, "scanId")?,
            student_id: string_field(fields, "studentId")?,
        })
    }

    pub fn matches(&self, item: &Value) -> bool {
        AlertMatch::from_item(item).as_ref() == Some(self)
    }
}

/// Denormalized per-actor alert feed. Items are kept as raw JSON so fields
/// this crate does not know about survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertFeedDocument {
    pub items: Vec<Value>,
}

impl AlertFeedDocument {
    pub fn from_document(document: Option<&Document>) -> Self {
        let items = document
            .and_then(|doc| doc.get(ITEMS_FIELD))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self { items }
    }

    /// Removes every item matching the compound key; returns how many went.
    pub fn remove_matching(&mut self, key: &AlertMatch) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !key.matches(item));
        before - self.items.len()
    }

    /// Appends `item` unless the feed already holds it: same compound key
    /// when the item carries one, identical JSON otherwise.
    pub fn insert_unique(&mut self, item: Value) -> bool {
        let duplicate = match AlertMatch::from_item(&item) {
            Some(key) => self.items.iter().any(|existing| key.matches(existing)),
            None => self.items.contains(&item),
        };
        if duplicate {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Field map for a merge-`put`; only `items` is written.
    pub fn to_fields(&self) -> Document {
        let mut fields = Document::new();
        fields.insert(ITEMS_FIELD.to_string(), Value::Array(self.items.clone()));
        fields
    }
}
