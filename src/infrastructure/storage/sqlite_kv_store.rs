use crate::application::ports::KeyValueStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

/// `KeyValueStore` over the `task_store_entries` table.
pub struct SqliteKeyValueStore {
    pool: Pool<Sqlite>,
}

impl SqliteKeyValueStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let payload: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM task_store_entries WHERE storage_key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(payload.map(|(value,)| value))
    }

    async fn write_batch(&self, entries: Vec<(String, Option<String>)>) -> Result<(), AppError> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            match value {
                Some(payload) => {
                    sqlx::query(
                        r#"
                        INSERT INTO task_store_entries (storage_key, payload, updated_at)
                        VALUES (?1, ?2, ?3)
                        ON CONFLICT(storage_key) DO UPDATE SET
                            payload = excluded.payload,
                            updated_at = excluded.updated_at
                        "#,
                    )
                    .bind(&key)
                    .bind(&payload)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query("DELETE FROM task_store_entries WHERE storage_key = ?1")
                        .bind(&key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
