use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type-specific key/value data of a task. Always a JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaskPayload(Map<String, Value>);

impl TaskPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err("Task payload cannot be null".to_string()),
            _ => Err("Task payload must be a JSON object".to_string()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Decodes the payload into a handler-specific shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| e.to_string())
    }

    pub fn into_inner(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<TaskPayload> for Value {
    fn from(payload: TaskPayload) -> Self {
        payload.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object_payloads() {
        assert!(TaskPayload::new(Value::Null).is_err());
        assert!(TaskPayload::new(json!([1, 2])).is_err());
        assert!(TaskPayload::from_json_str("{\"scanId\":\"s1\"}").is_ok());
    }
}
