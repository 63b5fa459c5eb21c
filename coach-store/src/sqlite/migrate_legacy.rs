//! One-way import of a legacy narrow-key database.
//!
//! The first storage generation keyed every table by a 64-bit Zobrist
//! hash of the position. The hash is lossy, so the wide canonical keys
//! cannot be recovered from hash-keyed rows alone; instead every table
//! is joined through the legacy `positions` table, which still carries
//! the full `(black, white, stm)` triple. Rows whose hash has no
//! position entry are unrecoverable — they are counted, logged, and
//! skipped rather than guessed at.
//!
//! The import is idempotent: a target that already holds data is left
//! untouched. All inserts run in a single transaction, so a failed
//! import leaves the target empty.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use othello::{Board, PositionKey, Side};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::helpers::encode_bitboard;
use super::move_graph_repo::edge_novelty;
use crate::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub skipped: bool,
    pub positions: u64,
    pub analyses: u64,
    pub edges: u64,
    pub games: u64,
    pub notes: u64,
    /// Hash-keyed rows with no recoverable position, plus games whose
    /// move transcript failed to parse.
    pub orphans: u64,
}

impl MigrationReport {
    fn has_data(&self) -> bool {
        self.positions > 0
            || self.analyses > 0
            || self.edges > 0
            || self.games > 0
            || self.notes > 0
    }
}

/// Import a narrow-key generation database into the (empty) wide-key
/// store behind `pool`.
pub async fn import_legacy_store(
    pool: &SqlitePool,
    legacy_path: &Path,
) -> Result<MigrationReport, StoreError> {
    info!(legacy = %legacy_path.display(), "starting legacy narrow-key import");

    let existing = target_counts(pool).await?;
    if existing.has_data() {
        info!(
            positions = existing.positions,
            analyses = existing.analyses,
            edges = existing.edges,
            games = existing.games,
            notes = existing.notes,
            "store already contains data, skipping legacy import"
        );
        return Ok(MigrationReport {
            skipped: true,
            ..existing
        });
    }

    if !legacy_path.exists() {
        return Err(StoreError::Migration(format!(
            "legacy store not found at {}",
            legacy_path.display()
        )));
    }

    let legacy = open_legacy(legacy_path).await?;
    let result = run_import(pool, &legacy).await;
    legacy.close().await;
    let report = result?;

    info!(
        positions = report.positions,
        analyses = report.analyses,
        edges = report.edges,
        games = report.games,
        notes = report.notes,
        orphans = report.orphans,
        "legacy narrow-key import completed"
    );
    Ok(report)
}

async fn open_legacy(path: &Path) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .map_err(sqlx::Error::from)?
        .read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(sqlx::Error::from)?;

    let (narrow,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM pragma_table_info('positions') WHERE name = 'hash'")
            .fetch_one(&pool)
            .await?;
    if narrow == 0 {
        pool.close().await;
        return Err(StoreError::Migration(format!(
            "{} is not a narrow-key generation store",
            path.display()
        )));
    }
    Ok(pool)
}

async fn run_import(pool: &SqlitePool, legacy: &SqlitePool) -> Result<MigrationReport, StoreError> {
    let mut report = MigrationReport::default();

    // The legacy positions table is the only place the full board
    // survives; everything else resolves through this map.
    let rows: Vec<(i64, i64, i64, i64, i64)> =
        sqlx::query_as("SELECT hash, black, white, stm, ply FROM positions")
            .fetch_all(legacy)
            .await?;
    let mut by_hash: HashMap<i64, Board> = HashMap::with_capacity(rows.len());
    for (hash, black, white, stm, ply) in rows {
        let side = if stm == 0 { Side::Black } else { Side::White };
        by_hash.insert(
            hash,
            Board::new(black as u64, white as u64, side, ply as u16),
        );
    }

    let analyses: Vec<(i64, i64, Option<i64>, Option<i64>, Option<i64>, Option<i64>, Option<i64>)> =
        sqlx::query_as("SELECT hash, depth, score, flag, best_move, nodes, time_ms FROM analyses")
            .fetch_all(legacy)
            .await?;
    let edges: Vec<(i64, i64, i64, Option<i64>, Option<i64>, Option<i64>, Option<i64>, Option<f64>)> =
        sqlx::query_as(
            "SELECT from_hash, move, to_hash, visit_count, wins, draws, losses, avg_score \
             FROM moves",
        )
        .fetch_all(legacy)
        .await?;
    let games: Vec<(Option<i64>, Option<i64>, Option<i64>, Option<String>, Option<String>)> =
        sqlx::query_as("SELECT start_hash, result, length, tags, pgn FROM games")
            .fetch_all(legacy)
            .await?;
    let notes: Vec<(i64, String)> = match sqlx::query_as("SELECT hash, text FROM notes")
        .fetch_all(legacy)
        .await
    {
        Ok(rows) => rows,
        // Early narrow-key files predate the notes table.
        Err(sqlx::Error::Database(e)) if e.message().contains("no such table") => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    let mut tx = pool.begin().await?;

    for board in by_hash.values() {
        let key = PositionKey::from_board(board);
        sqlx::query(
            "INSERT INTO positions (pos_key, black, white, stm, ply) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(key.to_string())
        .bind(encode_bitboard(board.black))
        .bind(encode_bitboard(board.white))
        .bind(board.side_to_move.as_char().to_string())
        .bind(board.ply as i64)
        .execute(&mut *tx)
        .await?;
        report.positions += 1;
    }

    for (hash, depth, score, flag, best_move, nodes, time_ms) in analyses {
        let Some(board) = by_hash.get(&hash) else {
            report.orphans += 1;
            continue;
        };
        // The old engine wrote -1 for "no best move"; the wide schema
        // uses NULL (and reserves -1 for an explicit pass).
        let best_move = best_move.filter(|&m| m >= 0);
        sqlx::query(
            r#"
            INSERT INTO analyses
                (pos_key, depth, score, flag, best_move, nodes, time_ms, engine_ver, win_prob)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'legacy', NULL)
            "#,
        )
        .bind(PositionKey::from_board(board).to_string())
        .bind(depth)
        .bind(score.unwrap_or(0))
        .bind(flag.unwrap_or(0))
        .bind(best_move)
        .bind(nodes.unwrap_or(0))
        .bind(time_ms.unwrap_or(0))
        .execute(&mut *tx)
        .await?;
        report.analyses += 1;
    }

    // Edge novelty was not stored by the old generation; recompute it
    // from the imported visit counts per origin.
    let mut origin_totals: HashMap<i64, i64> = HashMap::new();
    for (from_hash, _, _, visits, ..) in &edges {
        *origin_totals.entry(*from_hash).or_default() += visits.unwrap_or(0);
    }
    for (from_hash, mv, to_hash, visits, wins, draws, losses, avg_score) in edges {
        let (Some(from_board), Some(to_board)) = (by_hash.get(&from_hash), by_hash.get(&to_hash))
        else {
            report.orphans += 1;
            continue;
        };
        let visits = visits.unwrap_or(0);
        let total = origin_totals.get(&from_hash).copied().unwrap_or(visits);
        sqlx::query(
            r#"
            INSERT INTO moves
                (from_key, move, to_key, visits, wins, draws, losses, avg_score, novelty)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(PositionKey::from_board(from_board).to_string())
        .bind(mv)
        .bind(PositionKey::from_board(to_board).to_string())
        .bind(visits)
        .bind(wins.unwrap_or(0))
        .bind(draws.unwrap_or(0))
        .bind(losses.unwrap_or(0))
        .bind(avg_score.unwrap_or(0.0))
        .bind(edge_novelty(visits as u64, total as u64))
        .execute(&mut *tx)
        .await?;
        report.edges += 1;
    }

    for (start_hash, result, length, tags, pgn) in games {
        let Some(board) = start_hash.and_then(|h| by_hash.get(&h)) else {
            report.orphans += 1;
            continue;
        };
        let moves_text = pgn.unwrap_or_default();
        if othello::notation::parse_move_line(&moves_text).is_err() {
            warn!(moves = %moves_text, "skipping legacy game with unparseable transcript");
            report.orphans += 1;
            continue;
        }
        let tags = tags
            .filter(|t| serde_json::from_str::<serde_json::Value>(t).is_ok())
            .unwrap_or_else(|| "{}".to_string());
        // The old generation recorded no timestamps; zero marks the
        // rows as pre-import without inventing history.
        sqlx::query(
            r#"
            INSERT INTO games
                (start_key, result, length, tags, moves, started_at, finished_at)
            VALUES (?, ?, ?, ?, ?, 0, 0)
            "#,
        )
        .bind(PositionKey::from_board(board).to_string())
        .bind(result.unwrap_or(0))
        .bind(length.unwrap_or(0))
        .bind(tags)
        .bind(moves_text)
        .execute(&mut *tx)
        .await?;
        report.games += 1;
    }

    for (hash, text) in notes {
        let Some(board) = by_hash.get(&hash) else {
            report.orphans += 1;
            continue;
        };
        let key = PositionKey::from_board(board).to_string();
        sqlx::query("INSERT INTO notes (pos_key, text) VALUES (?, ?)")
            .bind(&key)
            .bind(&text)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO notes_fts (pos_key, text) VALUES (?, ?)")
            .bind(&key)
            .bind(&text)
            .execute(&mut *tx)
            .await?;
        report.notes += 1;
    }

    if report.orphans > 0 {
        warn!(
            orphans = report.orphans,
            "legacy rows skipped: their hash has no position entry to recover a wide key from"
        );
    }

    tx.commit().await?;
    Ok(report)
}

async fn target_counts(pool: &SqlitePool) -> Result<MigrationReport, StoreError> {
    async fn count(pool: &SqlitePool, sql: &str) -> Result<u64, StoreError> {
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await?;
        Ok(n as u64)
    }

    Ok(MigrationReport {
        skipped: false,
        positions: count(pool, "SELECT COUNT(*) FROM positions").await?,
        analyses: count(pool, "SELECT COUNT(*) FROM analyses").await?,
        edges: count(pool, "SELECT COUNT(*) FROM moves").await?,
        games: count(pool, "SELECT COUNT(*) FROM games").await?,
        notes: count(pool, "SELECT COUNT(*) FROM notes").await?,
        orphans: 0,
    })
}
