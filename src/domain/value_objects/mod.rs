pub mod document;
pub mod filter;
pub mod identifiers;
pub mod task_id;
pub mod task_payload;
pub mod task_type;

pub use document::{Collection, Document, DocumentKey, string_field};
pub use filter::{Condition, Filter};
pub use identifiers::{ActorUid, ParentId, ScanId, StudentId};
pub use task_id::TaskId;
pub use task_payload::TaskPayload;
pub use task_type::TaskType;
