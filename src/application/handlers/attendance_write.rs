use super::{TaskHandler, decode_payload};
use crate::application::ports::RemoteGateway;
use crate::domain::entities::ScanRecord;
use crate::domain::value_objects::{Collection, TaskPayload};
use crate::shared::error::TaskError;
use async_trait::async_trait;

/// Forwards a queued scan to the attendance collection. The record is keyed
/// by `(studentId, scanId)`, so resending overwrites the same document.
pub struct AttendanceWriteHandler;

#[async_trait]
impl TaskHandler for AttendanceWriteHandler {
    async fn handle(
        &self,
        payload: &TaskPayload,
        gateway: &dyn RemoteGateway,
    ) -> Result<(), TaskError> {
        let record: ScanRecord = decode_payload(payload)?;
        let fields = record
            .to_document()
            .map_err(|err| TaskError::InvalidPayload(err.to_string()))?;

        gateway
            .put(Collection::AttendanceRecords, &record.key(), fields)
            .await?;

        tracing::debug!(
            target: "sync::handler",
            student_id = %record.student_id,
            scan_id = %record.scan_id,
            "attendance record written"
        );
        Ok(())
    }
}
