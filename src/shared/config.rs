use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub undo: UndoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval_secs: u64,
    /// Failed attempts after which a task is moved to the dead-letter list.
    pub max_attempts: u32,
    pub task_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoConfig {
    pub eligibility_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/attendance_sync.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            sync: SyncConfig::default(),
            undo: UndoConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval_secs: 300, // 5 minutes
            max_attempts: 5,
            task_timeout_ms: 15_000,
        }
    }
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            eligibility_window_secs: 300,
        }
    }
}

impl SyncConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }
}

impl UndoConfig {
    pub fn eligibility_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.eligibility_window_secs).unwrap_or(i64::MAX))
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("ATTENDANCE_SYNC_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.database.url = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("ATTENDANCE_SYNC_MAX_CONNECTIONS")
            && let Some(value) = parse_u32(&v)
        {
            cfg.database.max_connections = value;
        }

        if let Ok(v) = std::env::var("ATTENDANCE_SYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("ATTENDANCE_SYNC_INTERVAL_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.sync_interval_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("ATTENDANCE_SYNC_MAX_ATTEMPTS")
            && let Some(value) = parse_u32(&v)
        {
            cfg.sync.max_attempts = value;
        }
        if let Ok(v) = std::env::var("ATTENDANCE_SYNC_TASK_TIMEOUT_MS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.task_timeout_ms = value;
        }

        if let Ok(v) = std::env::var("ATTENDANCE_SYNC_UNDO_WINDOW_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.undo.eligibility_window_secs = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.max_attempts == 0 {
            return Err("Sync max_attempts must be greater than 0".to_string());
        }
        if self.sync.task_timeout_ms == 0 {
            return Err("Sync task_timeout_ms must be greater than 0".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval_secs == 0 {
            return Err("Sync sync_interval_secs must be greater than 0".to_string());
        }
        if self.undo.eligibility_window_secs == 0 {
            return Err("Undo eligibility_window_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}
