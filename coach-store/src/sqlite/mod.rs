//! SQLite-backed repository implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode** — one writer, multiple concurrent readers.
//! - **Busy timeout** — writers queue briefly instead of failing on
//!   first contention; a bounded retry layer on top surfaces
//!   `ConcurrentWriteConflict` once exhausted.
//! - **Embedded migrations** — `sqlx::migrate!` runs
//!   `migrations/001_initial_schema.sql` when [`Database::open`] is
//!   called. Opening a file from the legacy narrow-key generation fails
//!   with `SchemaMigrationRequired` before anything is touched.
//!
//! ## Repository types
//!
//! Each `Sqlite*Repository` holds a `SqlitePool` clone and implements
//! the corresponding trait from [`crate::traits`]. Every multi-row
//! mutation (edge outcome recording, annotation upsert, legacy import,
//! game append) runs inside exactly one transaction.
//!
//! ## Legacy import
//!
//! [`import_legacy_store`] performs the one-way, idempotent import of a
//! narrow-key database written by the previous generation, recovering
//! wide keys by joining hash-keyed rows through the legacy `positions`
//! table.

mod analysis_repo;
mod annotation_repo;
mod database;
mod feature_repo;
mod game_repo;
mod gdl_repo;
pub(crate) mod helpers;
mod ladder_repo;
mod mapping_repo;
mod migrate_legacy;
mod move_graph_repo;
mod position_repo;
pub(crate) mod retention;
pub(crate) mod retry;
mod trainer_repo;

#[cfg(test)]
mod integration_tests;

pub(crate) use analysis_repo::put_analysis;
pub(crate) use position_repo::upsert_position;

pub use analysis_repo::SqliteAnalysisRepository;
pub use annotation_repo::SqliteAnnotationRepository;
pub use database::Database;
pub use feature_repo::SqliteFeatureRepository;
pub use game_repo::SqliteGameRepository;
pub use gdl_repo::SqliteGdlProgramRepository;
pub use ladder_repo::SqliteLadderRepository;
pub use mapping_repo::SqliteMappingRepository;
pub use migrate_legacy::{import_legacy_store, MigrationReport};
pub use move_graph_repo::{edge_novelty, SqliteMoveGraphRepository};
pub use position_repo::SqlitePositionRepository;
pub use trainer_repo::SqliteTrainerRepository;
