//! SQLite database connection pool and migration runner.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_millis(4000);

/// Holds a connection pool to the SQLite database.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `path`, run migrations, and
    /// return a ready-to-use `Database`.
    ///
    /// A file written by the legacy narrow-key generation is refused
    /// with [`StoreError::SchemaMigrationRequired`] before migrations
    /// run, so the legacy data is never half-converted in place.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(sqlx::Error::from)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(sqlx::Error::from)?;

        if is_legacy_generation(&pool).await? {
            pool.close().await;
            return Err(StoreError::SchemaMigrationRequired {
                path: path.display().to_string(),
            });
        }

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create an in-memory database with migrations applied. A single
    /// connection is used since each SQLite `:memory:` connection is
    /// its own database.
    pub async fn new_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(sqlx::Error::from)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(sqlx::Error::from)?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run embedded migrations from `coach-store/migrations/`.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Detect a database written by the narrow-key generation: it has the
/// domain tables but no sqlx migration ledger, and its `positions`
/// table is keyed by an INTEGER `hash` column instead of `pos_key`.
async fn is_legacy_generation(pool: &SqlitePool) -> Result<bool, StoreError> {
    let (migrated,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if migrated > 0 {
        return Ok(false);
    }

    let (legacy,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM pragma_table_info('positions') WHERE name = 'hash'",
    )
    .fetch_one(pool)
    .await?;
    Ok(legacy > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = Database::new_in_memory().await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let db = Database::new_in_memory().await.unwrap();
        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .fetch_all(db.pool())
                .await
                .unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert!(names.contains(&"positions"));
        assert!(names.contains(&"analyses"));
        assert!(names.contains(&"moves"));
        assert!(names.contains(&"features"));
        assert!(names.contains(&"notes"));
        assert!(names.contains(&"games"));
        assert!(names.contains(&"trainer"));
        assert!(names.contains(&"ladders"));
        assert!(names.contains(&"mappings"));
        assert!(names.contains(&"gdl_programs"));
    }

    #[tokio::test]
    async fn test_fts_table_present() {
        let db = Database::new_in_memory().await.unwrap();
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='notes_fts'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 1);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        drop(Database::open(&db_path).await.unwrap());
        // A second open against the same file must not refuse or
        // re-apply migrations destructively.
        let db = Database::open(&db_path).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM positions")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }
}
