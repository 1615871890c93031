use crate::domain::entities::{DeadLetter, SyncReport};

/// Outbound signals for the UI collaborator (badges, toasts).
pub trait SyncEventEmitter: Send + Sync {
    fn emit_pass_completed(&self, report: &SyncReport) -> Result<(), String>;
    fn emit_dead_lettered(&self, dead_letter: &DeadLetter) -> Result<(), String>;
}
