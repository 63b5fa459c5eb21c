//! Shared encode/decode helpers for SQLite ↔ domain type conversions.

use othello::{Move, PositionKey};

use crate::records::{BoundFlag, Outcome};
use crate::StoreError;

// ── BoundFlag ──────────────────────────────────────────────────────────

/// Encode a bound flag to its integer column value (0/1/2, matching the
/// transposition-table convention the engine writes).
pub fn encode_flag(flag: BoundFlag) -> i64 {
    match flag {
        BoundFlag::Exact => 0,
        BoundFlag::Lower => 1,
        BoundFlag::Upper => 2,
    }
}

pub fn decode_flag(value: i64) -> Result<BoundFlag, StoreError> {
    match value {
        0 => Ok(BoundFlag::Exact),
        1 => Ok(BoundFlag::Lower),
        2 => Ok(BoundFlag::Upper),
        other => Err(StoreError::Corrupt(format!("bound flag {other}"))),
    }
}

// ── Outcome counters ───────────────────────────────────────────────────

/// Split an outcome into `(wins, draws, losses)` increments.
pub fn outcome_counters(outcome: Outcome) -> (i64, i64, i64) {
    match outcome {
        Outcome::Win => (1, 0, 0),
        Outcome::Draw => (0, 1, 0),
        Outcome::Loss => (0, 0, 1),
    }
}

// ── Keys and moves ─────────────────────────────────────────────────────

pub fn decode_key(text: &str) -> Result<PositionKey, StoreError> {
    text.parse()
        .map_err(|_| StoreError::Corrupt(format!("position key {text:?}")))
}

pub fn decode_move(index: i64) -> Result<Move, StoreError> {
    Move::from_index(index).map_err(|_| StoreError::Corrupt(format!("move index {index}")))
}

pub fn encode_optional_move(mv: Option<Move>) -> Option<i64> {
    mv.map(|m| m.to_index() as i64)
}

pub fn decode_optional_move(index: Option<i64>) -> Result<Option<Move>, StoreError> {
    index.map(decode_move).transpose()
}

// ── Bitboards ──────────────────────────────────────────────────────────

// SQLite integers are signed; bitboards round-trip through a plain
// bit-for-bit cast.
pub fn encode_bitboard(bb: u64) -> i64 {
    bb as i64
}

pub fn decode_bitboard(value: i64) -> u64 {
    value as u64
}

// ── Full-text query quoting ────────────────────────────────────────────

/// Quote each term of a user query so FTS5 treats it as plain words
/// rather than match-expression syntax. Terms are implicitly ANDed.
pub fn fts_quote(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}
