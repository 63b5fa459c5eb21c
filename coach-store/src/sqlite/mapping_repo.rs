//! SQLite-backed implementation of [`MappingRepository`].

use sqlx::SqlitePool;

use crate::records::CalibrationMapping;
use crate::traits::MappingRepository;
use crate::{now_timestamp, StoreError};

pub struct SqliteMappingRepository {
    pool: SqlitePool,
}

impl SqliteMappingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MappingRepository for SqliteMappingRepository {
    /// Recalibration replaces the stored mapping wholesale; mappings
    /// are never merged.
    async fn put(&self, engine_ver: &str, mapping: &serde_json::Value) -> Result<(), StoreError> {
        let json = serde_json::to_string(mapping)?;
        sqlx::query(
            "INSERT OR REPLACE INTO mappings (engine_ver, json, created_at) VALUES (?, ?, ?)",
        )
        .bind(engine_ver)
        .bind(json)
        .bind(now_timestamp() as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, engine_ver: &str) -> Result<Option<CalibrationMapping>, StoreError> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT json, created_at FROM mappings WHERE engine_ver = ?")
                .bind(engine_ver)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(json, created_at)| {
            Ok(CalibrationMapping {
                engine_ver: engine_ver.to_string(),
                mapping: serde_json::from_str(&json)?,
                created_at: created_at as u64,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::Database;
    use serde_json::json;

    async fn repo() -> SqliteMappingRepository {
        let db = Database::new_in_memory().await.unwrap();
        SqliteMappingRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let repo = repo().await;
        let mapping = json!({"d4": 1150, "d6": 1400, "d8": 1650});
        repo.put("1.4.0", &mapping).await.unwrap();

        let loaded = repo.get("1.4.0").await.unwrap().unwrap();
        assert_eq!(loaded.mapping, mapping);
        assert!(loaded.created_at > 0);
    }

    #[tokio::test]
    async fn test_recalibration_replaces_wholesale() {
        let repo = repo().await;
        repo.put("1.4.0", &json!({"d4": 1150, "d6": 1400}))
            .await
            .unwrap();
        repo.put("1.4.0", &json!({"d8": 1700})).await.unwrap();

        let loaded = repo.get("1.4.0").await.unwrap().unwrap();
        // No merging: the earlier depths are gone.
        assert_eq!(loaded.mapping, json!({"d8": 1700}));
    }

    #[tokio::test]
    async fn test_versions_are_independent() {
        let repo = repo().await;
        repo.put("1.4.0", &json!({"d4": 1150})).await.unwrap();
        repo.put("1.5.0", &json!({"d4": 1250})).await.unwrap();

        assert_eq!(
            repo.get("1.4.0").await.unwrap().unwrap().mapping["d4"],
            1150
        );
        assert_eq!(
            repo.get("1.5.0").await.unwrap().unwrap().mapping["d4"],
            1250
        );
        assert!(repo.get("0.9.0").await.unwrap().is_none());
    }
}
