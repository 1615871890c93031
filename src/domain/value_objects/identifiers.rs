use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, String> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(format!("{} cannot be empty", $label));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_identifier!(
    /// Formatted student identifier (e.g. `ST-001`).
    StudentId,
    "Student id"
);
string_identifier!(
    /// Identifier of one scan event for a student.
    ScanId,
    "Scan id"
);
string_identifier!(
    /// Auth-provider uid of the account that issued the mutation.
    ActorUid,
    "Actor uid"
);
string_identifier!(
    /// Formatted parent identifier (e.g. `P-1`).
    ParentId,
    "Parent id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_trimmed_and_non_empty() {
        assert_eq!(StudentId::new(" ST-001 ").unwrap().as_str(), "ST-001");
        assert!(ScanId::new("   ").is_err());
        assert!(serde_json::from_str::<ParentId>("\"\"").is_err());
    }
}
