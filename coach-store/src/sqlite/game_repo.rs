//! SQLite-backed implementation of [`GameRepository`].

use othello::notation::{format_move_line, parse_move_line};
use sqlx::SqlitePool;

use super::helpers::decode_key;
use crate::records::{GameRecord, NewGame};
use crate::traits::GameRepository;
use crate::{now_timestamp, StoreError};

pub struct SqliteGameRepository {
    pool: SqlitePool,
}

impl SqliteGameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Row type for game queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct GameRow {
    id: i64,
    start_key: String,
    result: i64,
    length: i64,
    tags: String,
    moves: String,
    started_at: i64,
    finished_at: i64,
}

impl GameRow {
    fn into_record(self) -> Result<GameRecord, StoreError> {
        let moves = parse_move_line(&self.moves)
            .map_err(|e| StoreError::Corrupt(format!("game {} moves: {e}", self.id)))?;
        Ok(GameRecord {
            id: self.id,
            start_key: decode_key(&self.start_key)?,
            result: self.result as i32,
            length: self.length as u32,
            tags: serde_json::from_str(&self.tags)?,
            moves,
            started_at: self.started_at as u64,
            finished_at: self.finished_at as u64,
        })
    }
}

impl GameRepository for SqliteGameRepository {
    /// Append-only: every call inserts a fresh row and returns its
    /// surrogate id. `finished_at` is stamped here, exactly once;
    /// identical submissions are kept as distinct games.
    async fn append(&self, game: &NewGame) -> Result<i64, StoreError> {
        let tags = serde_json::to_string(&game.tags)?;
        let moves = format_move_line(&game.moves);
        let finished_at = now_timestamp() as i64;

        let result = sqlx::query(
            r#"
            INSERT INTO games
                (start_key, result, length, tags, moves, started_at, finished_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(game.start_key.to_string())
        .bind(game.result as i64)
        .bind(game.length as i64)
        .bind(tags)
        .bind(moves)
        .bind(game.started_at as i64)
        .bind(finished_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> Result<Option<GameRecord>, StoreError> {
        let row: Option<GameRow> = sqlx::query_as(
            r#"
            SELECT id, start_key, result, length, tags, moves, started_at, finished_at
            FROM games
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(GameRow::into_record).transpose()
    }
}
