//! Error type for the knowledge store.
//!
//! Lookup misses are not errors: read operations return `Ok(None)` and
//! searches return empty result sets. Everything here represents a
//! failure the caller must handle.

use crate::records::MAX_TRAINER_BOX;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    /// The wide key function is collision-free by construction, so a
    /// stored row disagreeing with its own key means corrupted data or
    /// a defect in the key function. Fatal, never retried.
    #[error("position key {key} already maps to a different board")]
    KeyCollision { key: String },

    /// A write could not be serialized against a concurrent writer and
    /// the store's internal bounded retry was exhausted.
    #[error("write conflicted with a concurrent writer after {attempts} attempts")]
    ConcurrentWriteConflict { attempts: u32 },

    /// The file holds data written by the legacy narrow-key generation.
    /// It must be absorbed via the one-way import before use.
    #[error("{path} holds legacy narrow-key data; run the legacy import into a new store first")]
    SchemaMigrationRequired { path: String },

    /// Base table and full-text index disagree. Cannot happen while
    /// every annotation mutation stays inside one transaction; if
    /// observed, the index must be rebuilt, not silently repaired.
    #[error("annotation index out of sync with base table: {0}")]
    IndexDesync(String),

    #[error("trainer box {0} outside 1..={MAX_TRAINER_BOX}")]
    TrainerBoxOutOfRange(u8),

    /// A stored value failed to decode (malformed key text, move index
    /// out of range). Indicates external tampering or corruption.
    #[error("invalid stored data: {0}")]
    Corrupt(String),
}
