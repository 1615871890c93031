use std::fmt;
use thiserror::Error;

#[derive(Debug)]
pub enum AppError {
    Database(String),
    Storage(String),
    Gateway(String),
    NotFound(String),
    ValidationError(String),
    ConfigurationError(String),
    SerializationError(String),
    DeserializationError(String),
    UndoIneligible(String),
    Task(TaskError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Gateway(msg) => write!(f, "Gateway error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            AppError::UndoIneligible(msg) => write!(f, "Undo not allowed: {}", msg),
            AppError::Task(err) => write!(f, "Task error: {}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            AppError::DeserializationError(err.to_string())
        } else {
            AppError::SerializationError(err.to_string())
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err.to_string())
    }
}

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        AppError::Task(err)
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures reported by a [`RemoteGateway`](crate::application::ports::RemoteGateway).
///
/// A missing document is never an error at this level: deletes of absent
/// documents succeed and reads return `None`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transient network failure: {0}")]
    Transient(String),
    #[error("remote call timed out after {0}ms")]
    Timeout(u64),
    #[error("remote store rejected the request: {0}")]
    Rejected(String),
    #[error("malformed remote document: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transient(_) | GatewayError::Timeout(_))
    }
}

/// One failed step of a fan-out cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeFailure {
    pub step: String,
    pub target: String,
    pub error: GatewayError,
}

impl fmt::Display for CascadeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.step, self.target, self.error)
    }
}

/// Handler-level failures. The sync processor translates every variant into
/// "keep the task for the next pass" (or dead-letter it); none of them
/// reaches the caller that enqueued the task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("transient network error: {0}")]
    TransientNetwork(String),
    #[error("handler timed out after {0}ms")]
    Timeout(u64),
    #[error("no handler registered for task type `{0}`")]
    UnknownTaskType(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("{} cascade step(s) failed: {}", failures.len(), join_failures(failures))]
    PartialCascadeFailure { failures: Vec<CascadeFailure> },
}

impl TaskError {
    /// Permanent errors will fail identically on every retry.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TaskError::InvalidPayload(_))
    }
}

impl From<GatewayError> for TaskError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Timeout(ms) => TaskError::Timeout(ms),
            other => TaskError::TransientNetwork(other.to_string()),
        }
    }
}

fn join_failures(failures: &[CascadeFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
