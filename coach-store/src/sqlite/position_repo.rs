//! SQLite-backed implementation of [`PositionRepository`].

use othello::{Board, PositionKey, Side};
use sqlx::{SqliteConnection, SqlitePool};

use super::helpers::{decode_bitboard, encode_bitboard};
use crate::traits::PositionRepository;
use crate::StoreError;

pub struct SqlitePositionRepository {
    pool: SqlitePool,
}

impl SqlitePositionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PositionRow {
    black: i64,
    white: i64,
    stm: String,
    ply: i64,
}

impl PositionRow {
    fn into_board(self) -> Result<Board, StoreError> {
        let side = self
            .stm
            .chars()
            .next()
            .and_then(Side::from_char)
            .ok_or_else(|| StoreError::Corrupt(format!("side-to-move {:?}", self.stm)))?;
        Ok(Board::new(
            decode_bitboard(self.black),
            decode_bitboard(self.white),
            side,
            self.ply as u16,
        ))
    }
}

impl PositionRepository for SqlitePositionRepository {
    async fn upsert(&self, board: &Board) -> Result<(), StoreError> {
        let key = PositionKey::from_board(board);
        let mut conn = self.pool.acquire().await?;
        upsert_position(&mut conn, &key, board).await
    }

    async fn get(&self, key: &PositionKey) -> Result<Option<Board>, StoreError> {
        let row: Option<PositionRow> =
            sqlx::query_as("SELECT black, white, stm, ply FROM positions WHERE pos_key = ?")
                .bind(key.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(PositionRow::into_board).transpose()
    }
}

/// Insert the position if absent; verify the stored board otherwise.
///
/// The board columns are derivable from the key, so a mismatch can only
/// mean corruption or a key-function defect — surfaced as the fatal
/// [`StoreError::KeyCollision`], never repaired in place.
pub(crate) async fn upsert_position(
    conn: &mut SqliteConnection,
    key: &PositionKey,
    board: &Board,
) -> Result<(), StoreError> {
    let inserted = sqlx::query(
        "INSERT INTO positions (pos_key, black, white, stm, ply) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT (pos_key) DO NOTHING",
    )
    .bind(key.to_string())
    .bind(encode_bitboard(board.black))
    .bind(encode_bitboard(board.white))
    .bind(board.side_to_move.as_char().to_string())
    .bind(board.ply as i64)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted == 0 {
        let row: Option<(i64, i64, String)> =
            sqlx::query_as("SELECT black, white, stm FROM positions WHERE pos_key = ?")
                .bind(key.to_string())
                .fetch_optional(&mut *conn)
                .await?;
        if let Some((black, white, stm)) = row {
            let same = decode_bitboard(black) == board.black
                && decode_bitboard(white) == board.white
                && stm == board.side_to_move.as_char().to_string();
            if !same {
                return Err(StoreError::KeyCollision {
                    key: key.to_string(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::Database;

    #[tokio::test]
    async fn test_upsert_and_get_roundtrip() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqlitePositionRepository::new(db.pool().clone());

        let board = Board::initial();
        repo.upsert(&board).await.unwrap();

        let key = PositionKey::from_board(&board);
        let loaded = repo.get(&key).await.unwrap().unwrap();
        assert_eq!(loaded, board);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqlitePositionRepository::new(db.pool().clone());

        let key = PositionKey::from_board(&Board::initial());
        assert_eq!(repo.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_repeated_upsert_keeps_one_row() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqlitePositionRepository::new(db.pool().clone());

        let board = Board::initial();
        repo.upsert(&board).await.unwrap();
        repo.upsert(&board).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM positions")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_corrupted_row_is_a_key_collision() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqlitePositionRepository::new(db.pool().clone());

        let board = Board::initial();
        repo.upsert(&board).await.unwrap();

        // Tamper with the stored board behind the key's back.
        let key = PositionKey::from_board(&board);
        sqlx::query("UPDATE positions SET black = black + 1 WHERE pos_key = ?")
            .bind(key.to_string())
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.upsert(&board).await.unwrap_err();
        assert!(matches!(err, StoreError::KeyCollision { .. }));
    }
}
