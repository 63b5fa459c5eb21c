//! Async repository trait definitions for the knowledge store.
//!
//! Each trait abstracts over one aggregate so that alternative backends
//! can be slotted in behind the same contract via static dispatch.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so
//! that the futures are guaranteed `Send` — required by `tokio::spawn`
//! in self-play workers and the batched writer.

use othello::{Board, Move, PositionKey};

use crate::records::{
    AnalysisRecord, CalibrationMapping, FeatureVector, GameRecord, GoalProgram, LadderEntry,
    MoveEdge, NewGame, NewGoalProgram, Outcome, TrainerState,
};
use crate::StoreError;
use std::future::Future;

/// Repository for canonical positions.
///
/// One row per distinct canonical position. Upserting a key that
/// already maps to a *different* board is a [`StoreError::KeyCollision`]
/// — unreachable unless the data is corrupt, and fatal if observed.
pub trait PositionRepository: Send + Sync {
    fn upsert(&self, board: &Board) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn get(
        &self,
        key: &PositionKey,
    ) -> impl Future<Output = Result<Option<Board>, StoreError>> + Send;
}

/// Repository memoizing search results per `(position, depth)`.
///
/// `put` is idempotent under identical inputs; under differing inputs
/// for the same `(key, depth)` the newer write replaces the older
/// regardless of engine version ordering. Callers needing
/// version-monotonic overwrite must check the stored `engine_ver`
/// themselves before writing.
pub trait AnalysisRepository: Send + Sync {
    fn put(
        &self,
        key: &PositionKey,
        record: &AnalysisRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Best stored analysis at `depth >= min_depth`, deepest first, or
    /// `None`. A bounded result satisfies the depth request but only an
    /// EXACT flag makes the score reportable.
    fn get(
        &self,
        key: &PositionKey,
        min_depth: u8,
    ) -> impl Future<Output = Result<Option<AnalysisRecord>, StoreError>> + Send;
}

/// Repository for the persistent directed move graph.
pub trait MoveGraphRepository: Send + Sync {
    /// Atomically increment the matching counter for the edge, update
    /// the running average score, and recompute novelty for the edge
    /// and its siblings — all inside one transaction. Creates the edge
    /// on first observation; concurrent first-writes resolve via upsert
    /// so no edge is duplicated. The destination is trusted from the
    /// caller and never migrated on conflict.
    fn record_outcome(
        &self,
        from: &PositionKey,
        mv: Move,
        to: &PositionKey,
        outcome: Outcome,
    ) -> impl Future<Output = Result<MoveEdge, StoreError>> + Send;
    /// All edges terminating at `to` — transposition detection.
    fn neighbors_to(
        &self,
        to: &PositionKey,
    ) -> impl Future<Output = Result<Vec<MoveEdge>, StoreError>> + Send;
    /// All edges leaving `from`, most visited first.
    fn edges_from(
        &self,
        from: &PositionKey,
    ) -> impl Future<Output = Result<Vec<MoveEdge>, StoreError>> + Send;
}

/// Repository memoizing static board features per position.
///
/// A vector is all-or-nothing per engine version: recomputation under a
/// newer version replaces the row wholesale.
pub trait FeatureRepository: Send + Sync {
    fn put(
        &self,
        key: &PositionKey,
        vector: &FeatureVector,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn get(
        &self,
        key: &PositionKey,
    ) -> impl Future<Output = Result<Option<FeatureVector>, StoreError>> + Send;
}

/// Repository for free-text position notes with a synchronized
/// full-text index.
///
/// Every upsert performs a logical remove of the prior indexed text
/// followed by an add of the new text, inside the same transaction as
/// the base-row write, so the index is never observably stale.
pub trait AnnotationRepository: Send + Sync {
    fn upsert(
        &self,
        key: &PositionKey,
        text: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn delete(&self, key: &PositionKey) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Position keys ranked by relevance; finite and restartable.
    fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<PositionKey>, StoreError>> + Send;
    fn get(
        &self,
        key: &PositionKey,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
}

/// Append-only log of completed games. No update or delete is exposed;
/// duplicate submissions get fresh surrogate ids (deduplication is the
/// caller's responsibility).
pub trait GameRepository: Send + Sync {
    fn append(&self, game: &NewGame) -> impl Future<Output = Result<i64, StoreError>> + Send;
    fn get(&self, id: i64)
        -> impl Future<Output = Result<Option<GameRecord>, StoreError>> + Send;
}

/// Spaced-repetition state per position.
pub trait TrainerRepository: Send + Sync {
    fn put(
        &self,
        key: &PositionKey,
        state: &TrainerState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn get(
        &self,
        key: &PositionKey,
    ) -> impl Future<Output = Result<Option<TrainerState>, StoreError>> + Send;
}

/// Rating-ladder state per `(engine version, strength profile)`.
pub trait LadderRepository: Send + Sync {
    /// Upsert guarded by the monotonic `last_rated_at` invariant: a
    /// write older than the stored row is ignored. Returns whether the
    /// write was applied.
    fn put(&self, entry: &LadderEntry) -> impl Future<Output = Result<bool, StoreError>> + Send;
    fn get(
        &self,
        engine_ver: &str,
        profile: &str,
    ) -> impl Future<Output = Result<Option<LadderEntry>, StoreError>> + Send;
}

/// Depth↔strength calibration mapping per engine version, replaced
/// wholesale on recalibration.
pub trait MappingRepository: Send + Sync {
    fn put(
        &self,
        engine_ver: &str,
        mapping: &serde_json::Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn get(
        &self,
        engine_ver: &str,
    ) -> impl Future<Output = Result<Option<CalibrationMapping>, StoreError>> + Send;
}

/// Stored goal programs: source text plus parsed form.
pub trait GdlProgramRepository: Send + Sync {
    fn store(
        &self,
        program: &NewGoalProgram,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;
    fn load(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<GoalProgram>, StoreError>> + Send;
    /// Replace source and parsed form, bumping `updated_at`. Returns
    /// whether a row with that id existed.
    fn update(
        &self,
        id: i64,
        program: &NewGoalProgram,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
