use chrono::Utc;
use sqlx::Row;

use super::{blob_checksum, RepositoryError, StateStore};
use crate::DbPool;

/// `StateStore` backed by the `state_blob` table, one row per key.
pub struct SqlStateStore {
    pool: DbPool,
}

impl SqlStateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl StateStore for SqlStateStore {
    async fn load(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT blob, checksum FROM state_blob WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let blob: String = row.try_get("blob").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let checksum: String =
            row.try_get("checksum").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        if blob_checksum(&blob) != checksum {
            return Err(RepositoryError::ChecksumMismatch { key: key.to_string() });
        }

        Ok(Some(blob))
    }

    async fn save(&self, key: &str, blob: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO state_blob (key, blob, checksum, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 blob = excluded.blob,
                 checksum = excluded.checksum,
                 updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(blob)
        .bind(blob_checksum(blob))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::SqlStateStore;
    use crate::repositories::{RepositoryError, StateStore};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    async fn save_then_load_returns_latest_blob() {
        let store = SqlStateStore::new(pool().await);

        assert!(store.load("q2d.workflow_state.v1").await.expect("load").is_none());

        store.save("q2d.workflow_state.v1", "{\"items\":[]}").await.expect("first save");
        store.save("q2d.workflow_state.v1", "{\"items\":[1]}").await.expect("second save");

        let blob = store.load("q2d.workflow_state.v1").await.expect("load");
        assert_eq!(blob.as_deref(), Some("{\"items\":[1]}"));
    }

    #[tokio::test]
    async fn one_row_per_key() {
        let pool = pool().await;
        let store = SqlStateStore::new(pool.clone());

        store.save("a", "1").await.expect("save a");
        store.save("a", "2").await.expect("save a again");
        store.save("b", "3").await.expect("save b");

        let count = sqlx::query("SELECT COUNT(*) AS count FROM state_blob")
            .fetch_one(&pool)
            .await
            .expect("count rows")
            .get::<i64, _>("count");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn tampered_blob_is_reported() {
        let pool = pool().await;
        let store = SqlStateStore::new(pool.clone());
        store.save("q2d.workflow_state.v1", "{\"items\":[]}").await.expect("save");

        sqlx::query("UPDATE state_blob SET blob = '{\"items\":null}' WHERE key = ?")
            .bind("q2d.workflow_state.v1")
            .execute(&pool)
            .await
            .expect("tamper");

        let result = store.load("q2d.workflow_state.v1").await;
        assert!(matches!(
            result,
            Err(RepositoryError::ChecksumMismatch { ref key }) if key == "q2d.workflow_state.v1"
        ));
    }
}
