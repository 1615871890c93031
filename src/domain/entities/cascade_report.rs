use crate::domain::value_objects::ParentId;
use serde::{Deserialize, Serialize};

/// What an undo cascade actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// `false` when the scan record was already gone.
    pub scan_record_deleted: bool,
    pub parents: Vec<ParentId>,
    pub parent_items_removed: usize,
    pub student_items_removed: usize,
}
