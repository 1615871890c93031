pub mod entities;
pub mod value_objects;

pub use entities::{DeadLetter, QueuedTask, SyncReport, Task};
pub use value_objects::{TaskId, TaskPayload, TaskType};
