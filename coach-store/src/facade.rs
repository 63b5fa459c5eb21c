//! The store facade collaborators hold.

use std::path::Path;

use othello::{Board, PositionKey};

use crate::records::AnalysisRecord;
use crate::sqlite::{
    self, import_legacy_store, Database, MigrationReport, SqliteAnalysisRepository,
    SqliteAnnotationRepository, SqliteFeatureRepository, SqliteGameRepository,
    SqliteGdlProgramRepository, SqliteLadderRepository, SqliteMappingRepository,
    SqliteMoveGraphRepository, SqlitePositionRepository, SqliteTrainerRepository,
};
use crate::{config, StoreError};

/// Single transactional boundary over the knowledge base.
///
/// Owns the connection pool and schema lifecycle; hands out
/// per-aggregate repositories that share the pool. Cloning is cheap and
/// every clone talks to the same database, so self-play workers, the
/// scheduler, and the rating job can each hold their own copy.
#[derive(Clone)]
pub struct CoachStore {
    db: Database,
}

impl CoachStore {
    /// Open (or create) the store at `path`. Migrations run here; a
    /// legacy narrow-key file is refused with
    /// [`StoreError::SchemaMigrationRequired`] — import it into a fresh
    /// store with [`CoachStore::import_legacy`] instead.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            db: Database::open(path).await?,
        })
    }

    /// Open the store at the configured default location.
    pub async fn open_default() -> Result<Self, StoreError> {
        Self::open(&config::db_path()).await
    }

    /// In-memory store, for tests and throwaway sessions.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            db: Database::new_in_memory().await?,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // ── Repositories ───────────────────────────────────────────────

    pub fn positions(&self) -> SqlitePositionRepository {
        SqlitePositionRepository::new(self.db.pool().clone())
    }

    pub fn analyses(&self) -> SqliteAnalysisRepository {
        SqliteAnalysisRepository::new(self.db.pool().clone())
    }

    pub fn move_graph(&self) -> SqliteMoveGraphRepository {
        SqliteMoveGraphRepository::new(self.db.pool().clone())
    }

    pub fn features(&self) -> SqliteFeatureRepository {
        SqliteFeatureRepository::new(self.db.pool().clone())
    }

    pub fn annotations(&self) -> SqliteAnnotationRepository {
        SqliteAnnotationRepository::new(self.db.pool().clone())
    }

    pub fn games(&self) -> SqliteGameRepository {
        SqliteGameRepository::new(self.db.pool().clone())
    }

    pub fn trainer(&self) -> SqliteTrainerRepository {
        SqliteTrainerRepository::new(self.db.pool().clone())
    }

    pub fn ladders(&self) -> SqliteLadderRepository {
        SqliteLadderRepository::new(self.db.pool().clone())
    }

    pub fn mappings(&self) -> SqliteMappingRepository {
        SqliteMappingRepository::new(self.db.pool().clone())
    }

    pub fn gdl_programs(&self) -> SqliteGdlProgramRepository {
        SqliteGdlProgramRepository::new(self.db.pool().clone())
    }

    // ── Cross-aggregate operations ─────────────────────────────────

    /// Record a search result together with its position, atomically.
    /// This is the path the engine takes after every search: either
    /// both rows land or neither does.
    pub async fn save_analysis(
        &self,
        board: &Board,
        record: &AnalysisRecord,
    ) -> Result<(), StoreError> {
        let key = PositionKey::from_board(board);
        sqlite::retry::write(|| async {
            let mut tx = self.db.pool().begin().await?;
            sqlite::upsert_position(&mut tx, &key, board).await?;
            sqlite::put_analysis(&mut tx, &key, record).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    /// One-way import of a legacy narrow-key database. Idempotent:
    /// a store that already holds data is left untouched.
    pub async fn import_legacy(&self, legacy_path: &Path) -> Result<MigrationReport, StoreError> {
        import_legacy_store(self.db.pool(), legacy_path).await
    }

    /// Retention: keep at most `cap` edges per origin position,
    /// dropping the least-visited. Returns the number removed.
    pub async fn prune_move_graph(&self, cap: u32) -> Result<u64, StoreError> {
        sqlite::retention::cap_moves_per_position(self.db.pool(), cap).await
    }
}
