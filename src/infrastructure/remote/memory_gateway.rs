use crate::application::ports::RemoteGateway;
use crate::domain::value_objects::{Collection, Document, DocumentKey, Filter};
use crate::shared::error::GatewayError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

type CollectionMap = BTreeMap<DocumentKey, Document>;

/// In-process remote store with the same semantics the handlers rely on:
/// field-merge upserts and no-op deletes of missing documents.
#[derive(Default)]
pub struct InMemoryRemoteGateway {
    collections: RwLock<HashMap<Collection, CollectionMap>>,
}

impl InMemoryRemoteGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` verbatim, replacing any previous version.
    pub async fn seed(&self, collection: Collection, key: DocumentKey, document: Document) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .insert(key, document);
    }

    pub async fn document(&self, collection: Collection, key: &DocumentKey) -> Option<Document> {
        let collections = self.collections.read().await;
        collections.get(&collection)?.get(key).cloned()
    }

    pub async fn documents(&self, collection: Collection) -> Vec<(DocumentKey, Document)> {
        let collections = self.collections.read().await;
        collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, doc)| (key.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteGateway for InMemoryRemoteGateway {
    async fn get(
        &self,
        collection: Collection,
        key: &DocumentKey,
    ) -> Result<Option<Document>, GatewayError> {
        Ok(self.document(collection, key).await)
    }

    async fn put(
        &self,
        collection: Collection,
        key: &DocumentKey,
        fields: Document,
    ) -> Result<(), GatewayError> {
        let mut collections = self.collections.write().await;
        let document = collections
            .entry(collection)
            .or_default()
            .entry(key.clone())
            .or_default();
        for (field, value) in fields {
            document.insert(field, value);
        }
        Ok(())
    }

    async fn delete(
        &self,
        collection: Collection,
        key: &DocumentKey,
    ) -> Result<bool, GatewayError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(key))
            .is_some())
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, GatewayError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
