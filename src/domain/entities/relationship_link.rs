use crate::domain::value_objects::{Document, Filter, ParentId, string_field};

pub const ACTIVE_STATUS: &str = "active";

/// Parent/student association, read-only to this crate.
///
/// The student side is stored under two identifier spaces: `studentId`
/// (auth uid) on some links and `studentIdNumber` (formatted id) on others.
/// Both are folded into `student_keys` here so callers never name the
/// individual fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipLink {
    pub parent_id: ParentId,
    pub student_keys: Vec<String>,
    pub active: bool,
}

impl RelationshipLink {
    pub const STUDENT_KEY_FIELDS: [&'static str; 2] = ["studentId", "studentIdNumber"];

    pub fn from_document(document: &Document) -> Option<Self> {
        let parent_id = ParentId::new(string_field(document, "parentId")?).ok()?;
        let student_keys = Self::STUDENT_KEY_FIELDS
            .iter()
            .filter_map(|field| string_field(document, field))
            .filter(|value| !value.trim().is_empty())
            .collect();
        let active = string_field(document, "status").as_deref() == Some(ACTIVE_STATUS);

        Some(Self {
            parent_id,
            student_keys,
            active,
        })
    }

    /// Active links whose student side matches any of `identities`, in
    /// either identifier space.
    pub fn discovery_filter<I, S>(identities: I) -> Filter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::new()
            .eq("status", ACTIVE_STATUS)
            .any_field_in(Self::STUDENT_KEY_FIELDS, identities)
    }

    pub fn refers_to(&self, identity: &str) -> bool {
        self.student_keys.iter().any(|key| key == identity)
    }
}
