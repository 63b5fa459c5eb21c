//! SQLite-backed implementation of [`AnalysisRepository`].

use othello::PositionKey;
use sqlx::{SqliteConnection, SqlitePool};

use super::helpers::{decode_flag, decode_optional_move, encode_flag, encode_optional_move};
use crate::records::AnalysisRecord;
use crate::traits::AnalysisRepository;
use crate::StoreError;

pub struct SqliteAnalysisRepository {
    pool: SqlitePool,
}

impl SqliteAnalysisRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Row type for analysis queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct AnalysisRow {
    depth: i64,
    score: i64,
    flag: i64,
    best_move: Option<i64>,
    nodes: i64,
    time_ms: i64,
    engine_ver: String,
    win_prob: Option<f64>,
}

impl AnalysisRow {
    fn into_record(self) -> Result<AnalysisRecord, StoreError> {
        Ok(AnalysisRecord {
            depth: self.depth as u8,
            score: self.score as i32,
            flag: decode_flag(self.flag)?,
            best_move: decode_optional_move(self.best_move)?,
            nodes: self.nodes as u64,
            time_ms: self.time_ms as u64,
            engine_ver: self.engine_ver,
            win_prob: self.win_prob,
        })
    }
}

impl AnalysisRepository for SqliteAnalysisRepository {
    async fn put(&self, key: &PositionKey, record: &AnalysisRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        put_analysis(&mut conn, key, record).await
    }

    async fn get(
        &self,
        key: &PositionKey,
        min_depth: u8,
    ) -> Result<Option<AnalysisRecord>, StoreError> {
        let row: Option<AnalysisRow> = sqlx::query_as(
            r#"
            SELECT depth, score, flag, best_move, nodes, time_ms, engine_ver, win_prob
            FROM analyses
            WHERE pos_key = ? AND depth >= ?
            ORDER BY depth DESC
            LIMIT 1
            "#,
        )
        .bind(key.to_string())
        .bind(min_depth as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AnalysisRow::into_record).transpose()
    }
}

/// Upsert keyed by `(pos_key, depth)`. Latest write wins, whatever
/// engine version produced it; version-aware overwrite is the caller's
/// obligation.
pub(crate) async fn put_analysis(
    conn: &mut SqliteConnection,
    key: &PositionKey,
    record: &AnalysisRecord,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO analyses
            (pos_key, depth, score, flag, best_move, nodes, time_ms, engine_ver, win_prob)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(key.to_string())
    .bind(record.depth as i64)
    .bind(record.score as i64)
    .bind(encode_flag(record.flag))
    .bind(encode_optional_move(record.best_move))
    .bind(record.nodes as i64)
    .bind(record.time_ms as i64)
    .bind(&record.engine_ver)
    .bind(record.win_prob)
    .execute(conn)
    .await?;
    Ok(())
}
