//! Domain record types held by the store.

use othello::{Move, PositionKey};
use serde::{Deserialize, Serialize};

/// Marks whether a stored score is exact or only a one-sided bound
/// left behind by pruning. Bounded results may drive move ordering but
/// must never be reported as final scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundFlag {
    Exact,
    Lower,
    Upper,
}

/// A memoized search result for one `(position, depth)`.
///
/// For a fixed `(position, depth)` the latest write wins regardless of
/// which engine version produced it. `engine_ver` is exposed here so a
/// caller that wants version-monotonic overwrite can check the stored
/// version before writing; the store itself does not enforce that.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub depth: u8,
    pub score: i32,
    pub flag: BoundFlag,
    pub best_move: Option<Move>,
    pub nodes: u64,
    pub time_ms: u64,
    pub engine_ver: String,
    pub win_prob: Option<f64>,
}

/// Result of one played-out game from the mover's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    /// Scoring convention used for the running edge average:
    /// win = +1, draw = 0, loss = −1.
    pub fn score(self) -> f64 {
        match self {
            Self::Win => 1.0,
            Self::Draw => 0.0,
            Self::Loss => -1.0,
        }
    }
}

/// A directed, statistics-bearing arc between two positions labeled by
/// the move connecting them. The destination is a pure function of
/// `(from, mv)` under the game rules and never changes once written.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEdge {
    pub from: PositionKey,
    pub mv: Move,
    pub to: PositionKey,
    pub visits: u64,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    pub avg_score: f64,
    pub novelty: f64,
}

/// Static board features memoized per position. Replaced wholesale when
/// a newer engine version recomputes them; never partially updated.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub mobility: i32,
    pub pot_mobility: i32,
    pub frontier: i32,
    pub stability: i32,
    pub parity: i32,
    pub corners: i32,
    pub x_squares: i32,
    pub engine_ver: String,
    /// Computation time, recorded for staleness auditing only — the
    /// store performs no expiry.
    pub computed_at: u64,
}

/// A completed game submitted to the append-only log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub start_key: PositionKey,
    /// Final disc differential, positive when Black won.
    pub result: i32,
    pub length: u32,
    pub tags: serde_json::Value,
    pub moves: Vec<Move>,
    pub started_at: u64,
}

/// A stored game. `finished_at` is stamped exactly once, at append
/// time; rows are never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub id: i64,
    pub start_key: PositionKey,
    pub result: i32,
    pub length: u32,
    pub tags: serde_json::Value,
    pub moves: Vec<Move>,
    pub started_at: u64,
    pub finished_at: u64,
}

/// Highest spaced-repetition difficulty tier.
pub const MAX_TRAINER_BOX: u8 = 5;

/// Spaced-repetition state for one position. Advanced only by the
/// scheduler collaborator; the store validates the box range and
/// persists faithfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerState {
    pub box_level: u8,
    pub due: Option<u64>,
    pub streak: u32,
    pub suspended: bool,
}

/// Rating-ladder state for one `(engine version, strength profile)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderEntry {
    pub engine_ver: String,
    pub profile: String,
    pub rating: f64,
    pub rd: f64,
    pub last_rated_at: u64,
}

/// Serialized depth↔strength calibration for one engine version.
/// Replaced wholesale on recalibration, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMapping {
    pub engine_ver: String,
    pub mapping: serde_json::Value,
    pub created_at: u64,
}

/// A goal program to be stored: name, source text, and the parsed form
/// produced by the goal-language parser. The parsed form must always be
/// re-derivable from the source; the store persists both faithfully and
/// leaves that law to the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoalProgram {
    pub name: String,
    pub source: String,
    pub ast: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgram {
    pub id: i64,
    pub name: String,
    pub source: String,
    pub ast: serde_json::Value,
    pub created_at: u64,
    pub updated_at: u64,
}
