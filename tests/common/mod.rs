#![allow(dead_code)]

use async_trait::async_trait;
use attendance_sync::domain::entities::ScanRecord;
use attendance_sync::domain::value_objects::{
    Collection, Document, DocumentKey, Filter, ScanId, StudentId,
};
use attendance_sync::shared::config::SyncConfig;
use attendance_sync::{
    GatewayError, HandlerRegistry, InMemoryRemoteGateway, MemoryKeyValueStore, RemoteGateway,
    SyncProcessor, TaskStore,
};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Gateway double: in-memory semantics plus switchable failures, either for
/// every call or for individual documents.
#[derive(Default)]
pub struct FlakyGateway {
    pub inner: InMemoryRemoteGateway,
    offline: AtomicBool,
    failing: Mutex<HashSet<(Collection, String)>>,
}

impl FlakyGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn fail_document(&self, collection: Collection, key: &str) {
        self.failing
            .lock()
            .await
            .insert((collection, key.to_string()));
    }

    pub async fn heal(&self) {
        self.failing.lock().await.clear();
        self.set_offline(false);
    }

    async fn check(&self, collection: Collection, key: &DocumentKey) -> Result<(), GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Transient("network unreachable".into()));
        }
        if self
            .failing
            .lock()
            .await
            .contains(&(collection, key.as_str().to_string()))
        {
            return Err(GatewayError::Transient(format!("{collection}/{key} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for FlakyGateway {
    async fn get(
        &self,
        collection: Collection,
        key: &DocumentKey,
    ) -> Result<Option<Document>, GatewayError> {
        self.check(collection, key).await?;
        self.inner.get(collection, key).await
    }

    async fn put(
        &self,
        collection: Collection,
        key: &DocumentKey,
        fields: Document,
    ) -> Result<(), GatewayError> {
        self.check(collection, key).await?;
        self.inner.put(collection, key, fields).await
    }

    async fn delete(
        &self,
        collection: Collection,
        key: &DocumentKey,
    ) -> Result<bool, GatewayError> {
        self.check(collection, key).await?;
        self.inner.delete(collection, key).await
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Transient("network unreachable".into()));
        }
        self.inner.query(collection, filter).await
    }
}

pub fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("object literal")
}

pub fn scan_alert(scan_id: &str, student_id: &str) -> Value {
    json!({"type": "attendance_scan", "scanId": scan_id, "studentId": student_id})
}

pub fn scan_key(student_id: &str, scan_id: &str) -> DocumentKey {
    ScanRecord::key_for(
        &StudentId::new(student_id).expect("student id"),
        &ScanId::new(scan_id).expect("scan id"),
    )
}

/// Seeds the canonical undo fixture: scan `s1` of `ST-001`, linked to
/// `P-1` by formatted id and `P-2` by uid, with an unrelated `P-3`.
pub async fn seed_undo_fixture(gateway: &InMemoryRemoteGateway) {
    gateway
        .seed(
            Collection::AttendanceRecords,
            scan_key("ST-001", "s1"),
            doc(json!({"studentId": "ST-001", "scanId": "s1", "entry": "IN"})),
        )
        .await;

    let links = [
        ("link-1", json!({"parentId": "P-1", "studentIdNumber": "ST-001", "status": "active"})),
        ("link-2", json!({"parentId": "P-2", "studentId": "u1", "status": "active"})),
        ("link-3", json!({"parentId": "P-3", "studentIdNumber": "ST-777", "status": "active"})),
        ("link-4", json!({"parentId": "P-4", "studentIdNumber": "ST-001", "status": "revoked"})),
    ];
    for (key, link) in links {
        gateway
            .seed(
                Collection::RelationshipLinks,
                DocumentKey::new(key),
                doc(link),
            )
            .await;
    }

    for parent in ["P-1", "P-2", "P-3", "P-4"] {
        gateway
            .seed(
                Collection::ParentAlerts,
                DocumentKey::new(parent),
                doc(json!({"items": [scan_alert("s1", "ST-001"), scan_alert("s1", "ST-777")]})),
            )
            .await;
    }
    gateway
        .seed(
            Collection::StudentAlerts,
            DocumentKey::new("ST-001"),
            doc(json!({"items": [scan_alert("s1", "ST-001")]})),
        )
        .await;
}

pub async fn feed_items(
    gateway: &InMemoryRemoteGateway,
    collection: Collection,
    key: &str,
) -> Vec<Value> {
    gateway
        .document(collection, &DocumentKey::new(key))
        .await
        .and_then(|doc| doc.get("items").and_then(Value::as_array).cloned())
        .unwrap_or_default()
}

pub fn memory_store() -> Arc<TaskStore> {
    Arc::new(TaskStore::new(Arc::new(MemoryKeyValueStore::new())))
}

pub fn processor(store: Arc<TaskStore>, gateway: Arc<dyn RemoteGateway>) -> SyncProcessor {
    SyncProcessor::new(
        store,
        HandlerRegistry::with_defaults(),
        gateway,
        SyncConfig::default(),
    )
}
