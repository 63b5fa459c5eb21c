//! Persistent analysis & knowledge store for the Othello coach.
//!
//! The store turns transient search results into a durable knowledge
//! base keyed by canonical position identity: transposition-style
//! analysis caching, a statistical move graph fed by self-play workers,
//! feature and annotation caches, an append-only game log, and a set of
//! small auxiliary fact tables (trainer state, rating ladders,
//! calibration mappings, stored goal programs).
//!
//! Everything is backed by one SQLite file in WAL mode. [`CoachStore`]
//! is the facade collaborators hold: it owns the pool, runs embedded
//! migrations at open time, refuses to open legacy narrow-key files
//! until [`CoachStore::import_legacy`] has absorbed them, and hands out
//! per-aggregate repositories that each keep their mutations inside a
//! single transaction.

mod config;
mod error;
mod facade;
mod records;
mod sqlite;
mod traits;
mod writer;

pub use config::{db_path, get_data_dir};
pub use error::StoreError;
pub use facade::CoachStore;
pub use records::{
    AnalysisRecord, BoundFlag, CalibrationMapping, FeatureVector, GameRecord, GoalProgram,
    LadderEntry, MoveEdge, NewGame, NewGoalProgram, Outcome, TrainerState, MAX_TRAINER_BOX,
};
pub use sqlite::{
    edge_novelty, import_legacy_store, Database, MigrationReport, SqliteAnalysisRepository,
    SqliteAnnotationRepository, SqliteFeatureRepository, SqliteGameRepository,
    SqliteGdlProgramRepository, SqliteLadderRepository, SqliteMappingRepository,
    SqliteMoveGraphRepository, SqlitePositionRepository, SqliteTrainerRepository,
};
pub use traits::{
    AnalysisRepository, AnnotationRepository, FeatureRepository, GameRepository,
    GdlProgramRepository, LadderRepository, MappingRepository, MoveGraphRepository,
    PositionRepository, TrainerRepository,
};
pub use writer::{StoreWriter, WriteOp};

use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
