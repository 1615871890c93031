use super::{TaskHandler, decode_payload};
use crate::application::ports::RemoteGateway;
use crate::domain::entities::AlertFeedDocument;
use crate::domain::value_objects::{Collection, DocumentKey, TaskPayload};
use crate::shared::error::TaskError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    Student,
    Parent,
}

impl RecipientKind {
    pub fn collection(self) -> Collection {
        match self {
            RecipientKind::Student => Collection::StudentAlerts,
            RecipientKind::Parent => Collection::ParentAlerts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recipient {
    pub kind: RecipientKind,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPayload {
    pub recipient: Recipient,
    pub item: Value,
}

/// Appends a notification item to its recipient's alert feed unless an
/// equivalent item is already there.
pub struct NotificationWriteHandler;

#[async_trait]
impl TaskHandler for NotificationWriteHandler {
    async fn handle(
        &self,
        payload: &TaskPayload,
        gateway: &dyn RemoteGateway,
    ) -> Result<(), TaskError> {
        let notification: NotificationPayload = decode_payload(payload)?;
        if notification.recipient.id.trim().is_empty() {
            return Err(TaskError::InvalidPayload(
                "notification recipient id is empty".to_string(),
            ));
        }
        if !notification.item.is_object() {
            return Err(TaskError::InvalidPayload(
                "notification item must be an object".to_string(),
            ));
        }

        let collection = notification.recipient.kind.collection();
        let key = DocumentKey::new(notification.recipient.id.trim());
        let current = gateway.get(collection, &key).await?;
        let mut feed = AlertFeedDocument::from_document(current.as_ref());

        if !feed.insert_unique(notification.item) {
            tracing::debug!(
                target: "sync::handler",
                recipient = %key,
                "notification already present in feed"
            );
            return Ok(());
        }

        gateway.put(collection, &key, feed.to_fields()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::InMemoryRemoteGateway;
    use serde_json::json;

    fn payload() -> TaskPayload {
        TaskPayload::new(json!({
            "recipient": {"kind": "parent", "id": "P-1"},
            "item": {
                "type": "attendance_scan",
                "scanId": "s1",
                "studentId": "ST-001",
                "entry": "IN"
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn running_twice_adds_one_item() {
        let gateway = InMemoryRemoteGateway::new();

        NotificationWriteHandler
            .handle(&payload(), &gateway)
            .await
            .unwrap();
        NotificationWriteHandler
            .handle(&payload(), &gateway)
            .await
            .unwrap();

        let feed = gateway
            .document(Collection::ParentAlerts, &DocumentKey::new("P-1"))
            .await
            .unwrap();
        assert_eq!(feed["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn keeps_other_feed_fields() {
        let gateway = InMemoryRemoteGateway::new();
        gateway
            .seed(
                Collection::ParentAlerts,
                DocumentKey::new("P-1"),
                json!({"items": [], "lastReadAt": 42})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await;

        NotificationWriteHandler
            .handle(&payload(), &gateway)
            .await
            .unwrap();

        let feed = gateway
            .document(Collection::ParentAlerts, &DocumentKey::new("P-1"))
            .await
            .unwrap();
        assert_eq!(feed["lastReadAt"], 42);
        assert_eq!(feed["items"].as_array().unwrap().len(), 1);
    }
}
