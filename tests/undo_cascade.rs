mod common;

use attendance_sync::domain::entities::UndoScanPayload;
use attendance_sync::domain::value_objects::{Collection, DocumentKey};
use attendance_sync::{InMemoryRemoteGateway, RemoteGateway, Task, TaskPayload, TaskType};
use common::{FlakyGateway, feed_items, memory_store, processor, scan_alert, scan_key};
use serde_json::json;
use std::sync::Arc;

fn undo_task() -> Task {
    Task::new(
        TaskType::UndoAttendanceScan,
        TaskPayload::new(json!({"scanId": "s1", "studentId": "ST-001", "uid": "u1"})).unwrap(),
    )
}

#[tokio::test]
async fn queued_undo_converges_in_one_pass() {
    let gateway = Arc::new(InMemoryRemoteGateway::new());
    gateway
        .seed(
            Collection::AttendanceRecords,
            scan_key("ST-001", "s1"),
            common::doc(json!({"entry": "IN"})),
        )
        .await;
    gateway
        .seed(
            Collection::RelationshipLinks,
            DocumentKey::new("link-1"),
            common::doc(json!({
                "parentId": "P-1",
                "studentIdNumber": "ST-001",
                "status": "active"
            })),
        )
        .await;
    gateway
        .seed(
            Collection::ParentAlerts,
            DocumentKey::new("P-1"),
            common::doc(json!({"items": [scan_alert("s1", "ST-001")]})),
        )
        .await;
    gateway
        .seed(
            Collection::StudentAlerts,
            DocumentKey::new("ST-001"),
            common::doc(json!({"items": [scan_alert("s1", "ST-001")]})),
        )
        .await;

    let store = memory_store();
    store.enqueue(undo_task()).await.unwrap();
    let processor = processor(store.clone(), gateway.clone());

    let report = processor.run_pass().await.unwrap();

    assert_eq!(report.processed_count, 1);
    assert_eq!(report.failed_count, 0);
    assert!(
        gateway
            .document(Collection::AttendanceRecords, &scan_key("ST-001", "s1"))
            .await
            .is_none()
    );
    assert!(feed_items(&gateway, Collection::ParentAlerts, "P-1").await.is_empty());
    assert!(feed_items(&gateway, Collection::StudentAlerts, "ST-001").await.is_empty());
    assert!(store.is_empty().await.unwrap());
}

#[tokio::test]
async fn fan_out_reaches_every_linked_parent_only() {
    let gateway = Arc::new(InMemoryRemoteGateway::new());
    common::seed_undo_fixture(&gateway).await;
    let store = memory_store();
    store.enqueue(undo_task()).await.unwrap();

    processor(store, gateway.clone()).run_pass().await.unwrap();

    // P-1 は学籍番号、P-2 は uid で紐付いている
    for parent in ["P-1", "P-2"] {
        assert_eq!(
            feed_items(&gateway, Collection::ParentAlerts, parent).await,
            vec![scan_alert("s1", "ST-777")]
        );
    }
    // 無関係な保護者と無効なリンクはそのまま
    for parent in ["P-3", "P-4"] {
        assert_eq!(feed_items(&gateway, Collection::ParentAlerts, parent).await.len(), 2);
    }
    assert!(feed_items(&gateway, Collection::StudentAlerts, "ST-001").await.is_empty());
}

#[tokio::test]
async fn undo_twice_matches_undo_once() {
    let once = Arc::new(InMemoryRemoteGateway::new());
    let twice = Arc::new(InMemoryRemoteGateway::new());
    common::seed_undo_fixture(&once).await;
    common::seed_undo_fixture(&twice).await;

    let store = memory_store();
    store.enqueue(undo_task()).await.unwrap();
    processor(store, once.clone()).run_pass().await.unwrap();

    let store = memory_store();
    store.enqueue(undo_task()).await.unwrap();
    store.enqueue(undo_task()).await.unwrap();
    let report = processor(store, twice.clone()).run_pass().await.unwrap();

    assert_eq!(report.processed_count, 2);
    assert_eq!(report.failed_count, 0);
    for collection in [
        Collection::AttendanceRecords,
        Collection::ParentAlerts,
        Collection::StudentAlerts,
        Collection::RelationshipLinks,
    ] {
        assert_eq!(once.documents(collection).await, twice.documents(collection).await);
    }
}

#[tokio::test]
async fn partial_cascade_failure_retries_until_converged() {
    let gateway = Arc::new(FlakyGateway::new());
    common::seed_undo_fixture(&gateway.inner).await;
    gateway.fail_document(Collection::ParentAlerts, "P-2").await;

    let store = memory_store();
    store.enqueue(undo_task()).await.unwrap();
    let processor = processor(store.clone(), gateway.clone());

    let first = processor.run_pass().await.unwrap();
    assert_eq!(first.failed_count, 1);
    assert_eq!(first.remaining_count, 1);
    // 失敗した保護者以外は既に反映済み
    assert_eq!(
        feed_items(&gateway.inner, Collection::ParentAlerts, "P-1")
            .await
            .len(),
        1
    );
    assert_eq!(
        feed_items(&gateway.inner, Collection::ParentAlerts, "P-2")
            .await
            .len(),
        2
    );
    assert!(
        feed_items(&gateway.inner, Collection::StudentAlerts, "ST-001")
            .await
            .is_empty()
    );

    gateway.heal().await;
    let second = processor.run_pass().await.unwrap();

    assert_eq!(second.processed_count, 1);
    assert_eq!(second.remaining_count, 0);
    assert_eq!(
        feed_items(&gateway.inner, Collection::ParentAlerts, "P-2").await,
        vec![scan_alert("s1", "ST-777")]
    );
}

#[tokio::test]
async fn handler_reports_the_cascade() {
    let gateway = Arc::new(InMemoryRemoteGateway::new());
    common::seed_undo_fixture(&gateway).await;
    let payload: UndoScanPayload =
        serde_json::from_value(json!({"scanId": "s1", "studentId": "ST-001", "actorUid": "u1"}))
            .unwrap();

    let report = attendance_sync::application::handlers::UndoAttendanceScanHandler
        .run(&payload, gateway.as_ref() as &dyn RemoteGateway)
        .await
        .unwrap();

    assert!(report.scan_record_deleted);
    assert_eq!(report.parents.len(), 2);
    assert_eq!(report.parent_items_removed, 2);
    assert_eq!(report.student_items_removed, 1);
}
