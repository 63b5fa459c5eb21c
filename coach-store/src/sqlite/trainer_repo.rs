//! SQLite-backed implementation of [`TrainerRepository`].

use othello::PositionKey;
use sqlx::SqlitePool;

use crate::records::{TrainerState, MAX_TRAINER_BOX};
use crate::traits::TrainerRepository;
use crate::StoreError;

pub struct SqliteTrainerRepository {
    pool: SqlitePool,
}

impl SqliteTrainerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TrainerRepository for SqliteTrainerRepository {
    async fn put(&self, key: &PositionKey, state: &TrainerState) -> Result<(), StoreError> {
        if !(1..=MAX_TRAINER_BOX).contains(&state.box_level) {
            return Err(StoreError::TrainerBoxOutOfRange(state.box_level));
        }

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO trainer (pos_key, box, due, streak, suspended)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(key.to_string())
        .bind(state.box_level as i64)
        .bind(state.due.map(|v| v as i64))
        .bind(state.streak as i64)
        .bind(state.suspended as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &PositionKey) -> Result<Option<TrainerState>, StoreError> {
        let row: Option<(i64, Option<i64>, i64, i64)> =
            sqlx::query_as("SELECT box, due, streak, suspended FROM trainer WHERE pos_key = ?")
                .bind(key.to_string())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(box_level, due, streak, suspended)| TrainerState {
            box_level: box_level as u8,
            due: due.map(|v| v as u64),
            streak: streak as u32,
            suspended: suspended != 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::Database;
    use othello::Board;

    fn key() -> PositionKey {
        PositionKey::from_board(&Board::initial())
    }

    async fn repo() -> SqliteTrainerRepository {
        let db = Database::new_in_memory().await.unwrap();
        SqliteTrainerRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let repo = repo().await;
        let state = TrainerState {
            box_level: 3,
            due: Some(1_700_086_400),
            streak: 4,
            suspended: false,
        };
        repo.put(&key(), &state).await.unwrap();
        assert_eq!(repo.get(&key()).await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_box_range_enforced() {
        let repo = repo().await;
        let bad = TrainerState {
            box_level: 0,
            due: None,
            streak: 0,
            suspended: false,
        };
        assert!(matches!(
            repo.put(&key(), &bad).await,
            Err(StoreError::TrainerBoxOutOfRange(0))
        ));

        let too_high = TrainerState {
            box_level: MAX_TRAINER_BOX + 1,
            ..bad
        };
        assert!(repo.put(&key(), &too_high).await.is_err());
        assert_eq!(repo.get(&key()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scheduler_advances_state() {
        let repo = repo().await;
        let state = TrainerState {
            box_level: 1,
            due: None,
            streak: 0,
            suspended: false,
        };
        repo.put(&key(), &state).await.unwrap();

        let advanced = TrainerState {
            box_level: 2,
            due: Some(1_700_172_800),
            streak: 1,
            suspended: true,
        };
        repo.put(&key(), &advanced).await.unwrap();
        assert_eq!(repo.get(&key()).await.unwrap(), Some(advanced));
    }
}
