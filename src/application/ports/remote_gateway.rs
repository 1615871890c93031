use crate::domain::value_objects::{Collection, Document, DocumentKey, Filter};
use crate::shared::error::GatewayError;
use async_trait::async_trait;

/// Point reads/writes/deletes on named, keyed remote collections.
///
/// Nothing here is transactional: handlers built on top of it must be
/// idempotent per step and must not assume all-or-nothing semantics across
/// documents.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn get(
        &self,
        collection: Collection,
        key: &DocumentKey,
    ) -> Result<Option<Document>, GatewayError>;

    /// Upsert with field-level merge: fields absent from `fields` are kept.
    async fn put(
        &self,
        collection: Collection,
        key: &DocumentKey,
        fields: Document,
    ) -> Result<(), GatewayError>;

    /// Deletes a document. Succeeds when the document does not exist;
    /// the returned flag tells whether anything was removed.
    async fn delete(&self, collection: Collection, key: &DocumentKey)
    -> Result<bool, GatewayError>;

    /// Predicate read used for discovery only.
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, GatewayError>;
}
