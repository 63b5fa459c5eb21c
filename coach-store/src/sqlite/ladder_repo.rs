//! SQLite-backed implementation of [`LadderRepository`].

use sqlx::SqlitePool;

use crate::records::LadderEntry;
use crate::traits::LadderRepository;
use crate::StoreError;

pub struct SqliteLadderRepository {
    pool: SqlitePool,
}

impl SqliteLadderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl LadderRepository for SqliteLadderRepository {
    /// `last_rated_at` is monotonically increasing per key: a write
    /// carrying an older timestamp than the stored row is dropped. The
    /// guard lives in the conflict arm so the check-and-write is one
    /// atomic statement.
    async fn put(&self, entry: &LadderEntry) -> Result<bool, StoreError> {
        let applied = sqlx::query(
            r#"
            INSERT INTO ladders (engine_ver, profile, rating, rd, last_rated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (engine_ver, profile) DO UPDATE SET
                rating        = excluded.rating,
                rd            = excluded.rd,
                last_rated_at = excluded.last_rated_at
            WHERE excluded.last_rated_at >= last_rated_at
            "#,
        )
        .bind(&entry.engine_ver)
        .bind(&entry.profile)
        .bind(entry.rating)
        .bind(entry.rd)
        .bind(entry.last_rated_at as i64)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if applied == 0 {
            tracing::warn!(
                engine_ver = %entry.engine_ver,
                profile = %entry.profile,
                "dropped stale ladder write"
            );
        }
        Ok(applied > 0)
    }

    async fn get(
        &self,
        engine_ver: &str,
        profile: &str,
    ) -> Result<Option<LadderEntry>, StoreError> {
        let row: Option<(f64, f64, i64)> = sqlx::query_as(
            "SELECT rating, rd, last_rated_at FROM ladders WHERE engine_ver = ? AND profile = ?",
        )
        .bind(engine_ver)
        .bind(profile)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(rating, rd, last_rated_at)| LadderEntry {
            engine_ver: engine_ver.to_string(),
            profile: profile.to_string(),
            rating,
            rd,
            last_rated_at: last_rated_at as u64,
        }))
    }
}
