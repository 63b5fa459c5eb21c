use std::path::Path;
use std::str::FromStr;

use othello::{Board, Move, PositionKey, Side, Square};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::{Database, SqliteMoveGraphRepository};
use crate::records::{AnalysisRecord, BoundFlag, NewGame, Outcome};
use crate::traits::{
    AnalysisRepository, AnnotationRepository, GameRepository, MoveGraphRepository,
    PositionRepository,
};
use crate::{CoachStore, StoreError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

fn place(index: u8) -> Move {
    Move::Place(Square::new(index).unwrap())
}

fn analysis(depth: u8, score: i32, flag: BoundFlag) -> AnalysisRecord {
    AnalysisRecord {
        depth,
        score,
        flag,
        best_move: Some(place(19)),
        nodes: 40_000,
        time_ms: 90,
        engine_ver: "1.4.0".to_string(),
        win_prob: None,
    }
}

#[tokio::test]
async fn test_concurrent_record_outcome_loses_no_updates() {
    init_tracing();
    const WORKERS: u64 = 6;
    const OUTCOMES_PER_WORKER: u64 = 20;

    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("store.db")).await.unwrap();
    let from = PositionKey::from_board(&Board::initial());
    let to = PositionKey::new(0x0000_0008_1800_0000, 0x0000_0010_0000_0000, Side::White);

    let mut tasks = Vec::new();
    for _ in 0..WORKERS {
        let repo = SqliteMoveGraphRepository::new(db.pool().clone());
        tasks.push(tokio::spawn(async move {
            for _ in 0..OUTCOMES_PER_WORKER {
                repo.record_outcome(&from, place(19), &to, Outcome::Win)
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let repo = SqliteMoveGraphRepository::new(db.pool().clone());
    let edges = repo.edges_from(&from).await.unwrap();
    assert_eq!(edges.len(), 1);
    // N workers × k outcomes, independent of interleaving.
    assert_eq!(edges[0].visits, WORKERS * OUTCOMES_PER_WORKER);
    assert_eq!(edges[0].wins, WORKERS * OUTCOMES_PER_WORKER);
    assert_eq!(edges[0].visits, edges[0].wins + edges[0].draws + edges[0].losses);
}

#[tokio::test]
async fn test_facade_save_analysis_writes_both_rows() {
    let store = CoachStore::open_in_memory().await.unwrap();
    let board = Board::initial();
    let key = PositionKey::from_board(&board);

    store
        .save_analysis(&board, &analysis(8, 12, BoundFlag::Exact))
        .await
        .unwrap();
    store
        .save_analysis(&board, &analysis(6, 5, BoundFlag::Lower))
        .await
        .unwrap();

    assert_eq!(store.positions().get(&key).await.unwrap(), Some(board));

    // The depth-8 exact row answers a min_depth=6 request.
    let best = store.analyses().get(&key, 6).await.unwrap().unwrap();
    assert_eq!(best.depth, 8);
    assert_eq!(best.score, 12);
    assert_eq!(best.flag, BoundFlag::Exact);
}

#[tokio::test]
async fn test_full_position_knowledge_flow() {
    let store = CoachStore::open_in_memory().await.unwrap();
    let board = Board::initial();
    let key = PositionKey::from_board(&board);
    let child = PositionKey::new(0x0000_0008_1800_0000, 0x0000_0010_0000_0000, Side::White);

    store
        .save_analysis(&board, &analysis(10, 4, BoundFlag::Exact))
        .await
        .unwrap();
    store
        .move_graph()
        .record_outcome(&key, place(19), &child, Outcome::Win)
        .await
        .unwrap();
    store
        .annotations()
        .upsert(&key, "the quiet diagonal start")
        .await
        .unwrap();
    let game_id = store
        .games()
        .append(&NewGame {
            start_key: key,
            result: 8,
            length: 60,
            tags: json!({"source": "selfplay"}),
            moves: vec![place(19), place(26)],
            started_at: 1_700_000_000,
        })
        .await
        .unwrap();

    // Everything is visible through the same facade.
    assert!(store.analyses().get(&key, 8).await.unwrap().is_some());
    let incoming = store.move_graph().neighbors_to(&child).await.unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].from, key);
    let hits = store.annotations().search("diagonal", 5).await.unwrap();
    assert_eq!(hits, vec![key]);
    assert!(store.games().get(game_id).await.unwrap().is_some());
}

// ── Legacy narrow-key import ───────────────────────────────────────────

const LEGACY_SCHEMA: &str = r#"
CREATE TABLE positions (
    hash INTEGER PRIMARY KEY,
    black INTEGER NOT NULL,
    white INTEGER NOT NULL,
    stm   INTEGER NOT NULL,
    ply   INTEGER DEFAULT 0
);
CREATE TABLE analyses (
    hash INTEGER,
    depth INTEGER,
    score INTEGER,
    flag  INTEGER,
    best_move INTEGER,
    nodes INTEGER,
    time_ms INTEGER,
    PRIMARY KEY (hash, depth)
);
CREATE TABLE moves (
    from_hash INTEGER,
    move INTEGER,
    to_hash INTEGER,
    visit_count INTEGER DEFAULT 0,
    wins INTEGER DEFAULT 0,
    draws INTEGER DEFAULT 0,
    losses INTEGER DEFAULT 0,
    avg_score REAL,
    PRIMARY KEY (from_hash, move)
);
CREATE TABLE games (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_hash INTEGER,
    result INTEGER,
    length INTEGER,
    tags TEXT,
    pgn TEXT
);
CREATE TABLE notes (
    hash INTEGER PRIMARY KEY,
    text TEXT
);
"#;

async fn write_legacy_fixture(path: &Path) -> (Board, Board) {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    for statement in LEGACY_SCHEMA.split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
    }

    let start = Board::initial();
    let after = Board::new(
        0x0000_0008_1800_0000,
        0x0000_0010_0000_0000,
        Side::White,
        1,
    );

    for board in [&start, &after] {
        sqlx::query("INSERT INTO positions (hash, black, white, stm, ply) VALUES (?, ?, ?, ?, ?)")
            .bind(board.narrow_hash() as i64)
            .bind(board.black as i64)
            .bind(board.white as i64)
            .bind(match board.side_to_move {
                Side::Black => 0i64,
                Side::White => 1,
            })
            .bind(board.ply as i64)
            .execute(&pool)
            .await
            .unwrap();
    }

    let start_hash = start.narrow_hash() as i64;
    let after_hash = after.narrow_hash() as i64;

    // -1 best_move meant "none" in the old generation.
    sqlx::query(
        "INSERT INTO analyses (hash, depth, score, flag, best_move, nodes, time_ms) \
         VALUES (?, 8, 12, 0, -1, 52000, 140)",
    )
    .bind(start_hash)
    .execute(&pool)
    .await
    .unwrap();

    // Orphan: its hash resolves to no stored position.
    sqlx::query(
        "INSERT INTO analyses (hash, depth, score, flag, best_move, nodes, time_ms) \
         VALUES (999999, 6, -3, 1, 19, 1000, 10)",
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO moves (from_hash, move, to_hash, visit_count, wins, draws, losses, avg_score) \
         VALUES (?, 19, ?, 5, 3, 1, 1, 0.4)",
    )
    .bind(start_hash)
    .bind(after_hash)
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO games (start_hash, result, length, tags, pgn) VALUES (?, 4, 60, '{}', 'd3 c5')",
    )
    .bind(start_hash)
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO notes (hash, text) VALUES (?, 'old corner trap note')")
        .bind(after_hash)
        .execute(&pool)
        .await
        .unwrap();

    pool.close().await;
    (start, after)
}

#[tokio::test]
async fn test_legacy_import_recovers_wide_keys() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = dir.path().join("legacy.sqlite");
    let (start, after) = write_legacy_fixture(&legacy_path).await;

    let store = CoachStore::open(&dir.path().join("store.db")).await.unwrap();
    let report = store.import_legacy(&legacy_path).await.unwrap();

    assert!(!report.skipped);
    assert_eq!(report.positions, 2);
    assert_eq!(report.analyses, 1);
    assert_eq!(report.edges, 1);
    assert_eq!(report.games, 1);
    assert_eq!(report.notes, 1);
    assert_eq!(report.orphans, 1);

    // Narrow-keyed rows are now reachable through wide keys.
    let start_key = PositionKey::from_board(&start);
    let after_key = PositionKey::from_board(&after);

    let rec = store.analyses().get(&start_key, 8).await.unwrap().unwrap();
    assert_eq!(rec.score, 12);
    assert_eq!(rec.engine_ver, "legacy");
    assert_eq!(rec.best_move, None);

    let edges = store.move_graph().edges_from(&start_key).await.unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].visits, 5);
    assert_eq!(edges[0].to, after_key);
    assert!(edges[0].novelty > 0.0);

    let game = store.games().get(1).await.unwrap().unwrap();
    assert_eq!(game.start_key, start_key);
    assert_eq!(game.moves.len(), 2);
    assert_eq!(game.finished_at, 0);

    // Imported notes are searchable immediately.
    let hits = store.annotations().search("corner", 5).await.unwrap();
    assert_eq!(hits, vec![after_key]);
    store.annotations().verify_index().await.unwrap();
}

#[tokio::test]
async fn test_legacy_import_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = dir.path().join("legacy.sqlite");
    write_legacy_fixture(&legacy_path).await;

    let store = CoachStore::open(&dir.path().join("store.db")).await.unwrap();
    let first = store.import_legacy(&legacy_path).await.unwrap();
    assert!(!first.skipped);

    let second = store.import_legacy(&legacy_path).await.unwrap();
    assert!(second.skipped);

    // Nothing was double-imported.
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM positions")
        .fetch_one(store.database().pool())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_opening_legacy_file_requires_migration() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = dir.path().join("legacy.sqlite");
    write_legacy_fixture(&legacy_path).await;

    let err = Database::open(&legacy_path).await.unwrap_err();
    assert!(matches!(err, StoreError::SchemaMigrationRequired { .. }));
}

#[tokio::test]
async fn test_import_refuses_non_legacy_file() {
    let dir = tempfile::tempdir().unwrap();

    // A wide-key store is not a valid import source.
    let other = dir.path().join("other.db");
    drop(CoachStore::open(&other).await.unwrap());

    let store = CoachStore::open(&dir.path().join("store.db")).await.unwrap();
    let err = store.import_legacy(&other).await.unwrap_err();
    assert!(matches!(err, StoreError::Migration(_)));
}
