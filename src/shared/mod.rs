pub mod config;
pub mod error;

pub use config::{AppConfig, DatabaseConfig, SyncConfig, UndoConfig};
pub use error::{AppError, CascadeFailure, GatewayError, Result, TaskError};
