pub mod alert_feed;
pub mod cascade_report;
pub mod relationship_link;
pub mod scan_record;
pub mod sync_report;
pub mod task;
pub mod undo;

pub use alert_feed::{ATTENDANCE_SCAN_ALERT, AlertFeedDocument, AlertMatch};
pub use cascade_report::CascadeReport;
pub use relationship_link::RelationshipLink;
pub use scan_record::{ScanEntry, ScanRecord};
pub use sync_report::{PassStatus, SyncReport};
pub use task::{DeadLetter, QueuedTask, Task};
pub use undo::{UndoOutcome, UndoScanPayload, UndoScanRequest};
