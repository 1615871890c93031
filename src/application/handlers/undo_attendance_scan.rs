use super::{TaskHandler, decode_payload};
use crate::application::ports::RemoteGateway;
use crate::domain::entities::{
    AlertFeedDocument, AlertMatch, CascadeReport, RelationshipLink, ScanRecord, UndoScanPayload,
};
use crate::domain::value_objects::{Collection, DocumentKey, ParentId, TaskPayload};
use crate::shared::error::{CascadeFailure, GatewayError, TaskError};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeSet;

const STEP_DELETE_SCAN: &str = "delete_scan_record";
const STEP_DISCOVER: &str = "discover_parents";
const STEP_PARENT_FEED: &str = "parent_feed";
const STEP_STUDENT_FEED: &str = "student_feed";

/// Undoes one attendance scan across every denormalized copy.
///
/// Steps, each independently idempotent:
/// 1. delete the scan record (already absent counts as done);
/// 2. discover parents through active relationship links, matching the
///    student under both identifier spaces;
/// 3. filter the alert out of every parent feed, concurrently;
/// 4. filter the alert out of the student's own feed.
///
/// This is best-effort fan-out, not a transaction. A failing step does not
/// stop the others, committed steps stay committed, and the task reports
/// [`TaskError::PartialCascadeFailure`] so the whole cascade is retried until
/// every step has converged.
pub struct UndoAttendanceScanHandler;

impl UndoAttendanceScanHandler {
    pub async fn run(
        &self,
        payload: &UndoScanPayload,
        gateway: &dyn RemoteGateway,
    ) -> Result<CascadeReport, TaskError> {
        let alert = AlertMatch::attendance_scan(&payload.scan_id, &payload.student_id);
        let mut report = CascadeReport::default();
        let mut failures = Vec::new();

        let scan_key = ScanRecord::key_for(&payload.student_id, &payload.scan_id);
        match gateway.delete(Collection::AttendanceRecords, &scan_key).await {
            Ok(deleted) => report.scan_record_deleted = deleted,
            Err(error) => failures.push(failure(STEP_DELETE_SCAN, scan_key.as_str(), error)),
        }

        match discover_parents(gateway, payload).await {
            Ok(parents) => {
                let rewrites = parents.iter().map(|parent| {
                    let key = DocumentKey::new(parent.as_str());
                    let alert = &alert;
                    async move {
                        remove_alert(gateway, Collection::ParentAlerts, &key, alert).await
                    }
                });
                let results = join_all(rewrites).await;

                for (parent, result) in parents.iter().zip(results) {
                    match result {
                        Ok(removed) => report.parent_items_removed += removed,
                        Err(error) => {
                            failures.push(failure(STEP_PARENT_FEED, parent.as_str(), error))
                        }
                    }
                }
                report.parents = parents;
            }
            Err(error) => failures.push(failure(
                STEP_DISCOVER,
                payload.student_id.as_str(),
                error,
            )),
        }

        let student_key = DocumentKey::new(payload.student_id.as_str());
        match remove_alert(gateway, Collection::StudentAlerts, &student_key, &alert).await {
            Ok(removed) => report.student_items_removed = removed,
            Err(error) => failures.push(failure(STEP_STUDENT_FEED, student_key.as_str(), error)),
        }

        if failures.is_empty() {
            tracing::info!(
                target: "sync::undo",
                scan_id = %payload.scan_id,
                student_id = %payload.student_id,
                parents = report.parents.len(),
                scan_record_deleted = report.scan_record_deleted,
                "undo cascade converged"
            );
            Ok(report)
        } else {
            tracing::warn!(
                target: "sync::undo",
                scan_id = %payload.scan_id,
                student_id = %payload.student_id,
                failed_steps = failures.len(),
                "undo cascade incomplete, will retry"
            );
            Err(TaskError::PartialCascadeFailure { failures })
        }
    }
}

#[async_trait]
impl TaskHandler for UndoAttendanceScanHandler {
    async fn handle(
        &self,
        payload: &TaskPayload,
        gateway: &dyn RemoteGateway,
    ) -> Result<(), TaskError> {
        let payload: UndoScanPayload = decode_payload(payload)?;
        self.run(&payload, gateway).await.map(|_| ())
    }
}

async fn discover_parents(
    gateway: &dyn RemoteGateway,
    payload: &UndoScanPayload,
) -> Result<Vec<ParentId>, GatewayError> {
    let identities = payload.identities();
    let documents = gateway
        .query(
            Collection::RelationshipLinks,
            &RelationshipLink::discovery_filter(identities.iter().cloned()),
        )
        .await?;

    let parents: BTreeSet<ParentId> = documents
        .iter()
        .filter_map(RelationshipLink::from_document)
        .filter(|link| link.active)
        .filter(|link| identities.iter().any(|identity| link.refers_to(identity)))
        .map(|link| link.parent_id)
        .collect();

    Ok(parents.into_iter().collect())
}

/// Filter-and-rewrite of one feed. Feeds without a matching item are not
/// written at all.
async fn remove_alert(
    gateway: &dyn RemoteGateway,
    collection: Collection,
    key: &DocumentKey,
    alert: &AlertMatch,
) -> Result<usize, GatewayError> {
    let current = gateway.get(collection, key).await?;
    let mut feed = AlertFeedDocument::from_document(current.as_ref());

    let removed = feed.remove_matching(alert);
    if removed > 0 {
        gateway.put(collection, key, feed.to_fields()).await?;
    }
    Ok(removed)
}

fn failure(step: &str, target: &str, error: GatewayError) -> CascadeFailure {
    CascadeFailure {
        step: step.to_string(),
        target: target.to_string(),
        error,
    }
}
