use super::document::{Document, string_field};
use serde::{Deserialize, Serialize};

/// One predicate over a document's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// `field == value`
    Eq { field: String, value: String },
    /// At least one of `fields` holds one of `values`.
    AnyFieldIn {
        fields: Vec<String>,
        values: Vec<String>,
    },
}

impl Condition {
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Condition::Eq { field, value } => {
                string_field(document, field).as_deref() == Some(value.as_str())
            }
            Condition::AnyFieldIn { fields, values } => fields.iter().any(|field| {
                string_field(document, field)
                    .map(|found| values.iter().any(|value| *value == found))
                    .unwrap_or(false)
            }),
        }
    }
}

/// Conjunction of conditions used for discovery queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn any_field_in<F, V>(mut self, fields: F, values: V) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        self.conditions.push(Condition::AnyFieldIn {
            fields: fields.into_iter().map(Into::into).collect(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// An empty filter matches every document.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|condition| condition.matches(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn any_field_in_checks_every_field() {
        let filter = Filter::new()
            .eq("status", "active")
            .any_field_in(["studentId", "studentIdNumber"], ["ST-001", "u1"]);

        assert!(filter.matches(&doc(json!({"status": "active", "studentIdNumber": "ST-001"}))));
        assert!(filter.matches(&doc(json!({"status": "active", "studentId": "u1"}))));
        assert!(!filter.matches(&doc(json!({"status": "inactive", "studentId": "u1"}))));
        assert!(!filter.matches(&doc(json!({"status": "active", "studentId": "u2"}))));
    }
}
