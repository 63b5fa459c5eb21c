//! SQLite-backed implementation of [`MoveGraphRepository`].

use othello::{Move, PositionKey};
use sqlx::SqlitePool;

use super::helpers::{decode_key, decode_move, outcome_counters};
use super::retry;
use crate::records::{MoveEdge, Outcome};
use crate::traits::MoveGraphRepository;
use crate::StoreError;

/// Visit count at which an edge's decaying interest halves.
const NOVELTY_HALF_LIFE_VISITS: f64 = 8.0;

/// Novelty of an edge as a pure function of its own visit count and the
/// total visits leaving its origin.
///
/// Never-visited edges score the maximal 1.0. Otherwise the score is
/// the edge's unexplored share among its siblings damped by an
/// exponential decay in its own visits, so it strictly decreases (or
/// sits at the 0.0 floor) as the edge is traversed relative to its
/// siblings. Recomputing from counts on every write keeps the value
/// identical under any interleaving of concurrent writers.
pub fn edge_novelty(visits: u64, origin_total: u64) -> f64 {
    if visits == 0 {
        return 1.0;
    }
    let total = origin_total.max(visits) as f64;
    let share = visits as f64 / total;
    (1.0 - share) * (0.5f64).powf(visits as f64 / NOVELTY_HALF_LIFE_VISITS)
}

pub struct SqliteMoveGraphRepository {
    pool: SqlitePool,
}

impl SqliteMoveGraphRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn try_record_outcome(
        &self,
        from: &PositionKey,
        mv: Move,
        to: &PositionKey,
        outcome: Outcome,
    ) -> Result<MoveEdge, StoreError> {
        let from_text = from.to_string();
        let move_index = mv.to_index() as i64;
        let (wins, draws, losses) = outcome_counters(outcome);
        let score = outcome.score();

        let mut tx = self.pool.begin().await?;

        // The increment is a single statement, so concurrent workers
        // reporting the same edge can never lose an update. Note the
        // conflict arm leaves to_key alone: the destination is a pure
        // function of (from, move) and must never migrate.
        sqlx::query(
            r#"
            INSERT INTO moves
                (from_key, move, to_key, visits, wins, draws, losses, avg_score, novelty)
            VALUES (?, ?, ?, 1, ?, ?, ?, ?, 1.0)
            ON CONFLICT (from_key, move) DO UPDATE SET
                visits    = visits + 1,
                wins      = wins + excluded.wins,
                draws     = draws + excluded.draws,
                losses    = losses + excluded.losses,
                avg_score = (avg_score * visits + excluded.avg_score) / (visits + 1)
            "#,
        )
        .bind(&from_text)
        .bind(move_index)
        .bind(to.to_string())
        .bind(wins)
        .bind(draws)
        .bind(losses)
        .bind(score)
        .execute(&mut *tx)
        .await?;

        // Refresh novelty across the whole sibling set from the counts
        // this transaction can now see.
        let siblings: Vec<(i64, i64)> =
            sqlx::query_as("SELECT move, visits FROM moves WHERE from_key = ?")
                .bind(&from_text)
                .fetch_all(&mut *tx)
                .await?;
        let origin_total: i64 = siblings.iter().map(|(_, v)| v).sum();
        for (sibling_move, visits) in &siblings {
            let novelty = edge_novelty(*visits as u64, origin_total as u64);
            sqlx::query("UPDATE moves SET novelty = ? WHERE from_key = ? AND move = ?")
                .bind(novelty)
                .bind(&from_text)
                .bind(sibling_move)
                .execute(&mut *tx)
                .await?;
        }

        let row: EdgeRow = sqlx::query_as(
            "SELECT from_key, move, to_key, visits, wins, draws, losses, avg_score, novelty \
             FROM moves WHERE from_key = ? AND move = ?",
        )
        .bind(&from_text)
        .bind(move_index)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_edge()
    }
}

/// Row type for edge queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct EdgeRow {
    from_key: String,
    #[sqlx(rename = "move")]
    move_index: i64,
    to_key: String,
    visits: i64,
    wins: i64,
    draws: i64,
    losses: i64,
    avg_score: f64,
    novelty: f64,
}

impl EdgeRow {
    fn into_edge(self) -> Result<MoveEdge, StoreError> {
        Ok(MoveEdge {
            from: decode_key(&self.from_key)?,
            mv: decode_move(self.move_index)?,
            to: decode_key(&self.to_key)?,
            visits: self.visits as u64,
            wins: self.wins as u64,
            draws: self.draws as u64,
            losses: self.losses as u64,
            avg_score: self.avg_score,
            novelty: self.novelty,
        })
    }
}

impl MoveGraphRepository for SqliteMoveGraphRepository {
    async fn record_outcome(
        &self,
        from: &PositionKey,
        mv: Move,
        to: &PositionKey,
        outcome: Outcome,
    ) -> Result<MoveEdge, StoreError> {
        retry::write(|| self.try_record_outcome(from, mv, to, outcome)).await
    }

    async fn neighbors_to(&self, to: &PositionKey) -> Result<Vec<MoveEdge>, StoreError> {
        let rows: Vec<EdgeRow> = sqlx::query_as(
            "SELECT from_key, move, to_key, visits, wins, draws, losses, avg_score, novelty \
             FROM moves WHERE to_key = ?",
        )
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EdgeRow::into_edge).collect()
    }

    async fn edges_from(&self, from: &PositionKey) -> Result<Vec<MoveEdge>, StoreError> {
        let rows: Vec<EdgeRow> = sqlx::query_as(
            "SELECT from_key, move, to_key, visits, wins, draws, losses, avg_score, novelty \
             FROM moves WHERE from_key = ? ORDER BY visits DESC",
        )
        .bind(from.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EdgeRow::into_edge).collect()
    }
}
