//! Move-graph retention.

use sqlx::SqlitePool;

use crate::StoreError;

/// Keep at most `cap` edges per origin, deleting the lowest-visit rows.
/// Returns the number of edges removed.
pub(crate) async fn cap_moves_per_position(
    pool: &SqlitePool,
    cap: u32,
) -> Result<u64, StoreError> {
    let deleted = sqlx::query(
        r#"
        DELETE FROM moves
        WHERE rowid IN (
            SELECT rowid FROM (
                SELECT rowid,
                       ROW_NUMBER() OVER (PARTITION BY from_key ORDER BY visits DESC) AS rn
                FROM moves
            )
            WHERE rn > ?
        )
        "#,
    )
    .bind(cap as i64)
    .execute(pool)
    .await?
    .rows_affected();

    if deleted > 0 {
        tracing::info!(deleted, cap, "pruned move graph");
    }
    Ok(deleted)
}
