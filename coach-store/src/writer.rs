//! Batched background writer.
//!
//! Self-play workers produce a steady trickle of small writes and do
//! not want per-row latency on their hot path. The writer task owns a
//! [`CoachStore`] clone, drains a channel of [`WriteOp`]s, and flushes
//! in batches on a short tick or when enough ops pile up. Writes are
//! fire-and-forget: a failed op is logged and dropped, never retried at
//! this layer (the repositories already retry transient contention).

use othello::{Board, Move, PositionKey};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::warn;

use crate::records::{NewGame, Outcome};
use crate::traits::{
    AnnotationRepository, GameRepository, MoveGraphRepository, PositionRepository,
};
use crate::CoachStore;

const FLUSH_INTERVAL: Duration = Duration::from_millis(250);
const MAX_PENDING: usize = 500;
const CHANNEL_CAPACITY: usize = 2048;

/// A deferred write accepted by the writer.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Position(Board),
    Note { key: PositionKey, text: String },
    Outcome {
        from: PositionKey,
        mv: Move,
        to: PositionKey,
        outcome: Outcome,
    },
    Game(NewGame),
}

/// Handle to the background writer task.
pub struct StoreWriter {
    tx: mpsc::Sender<WriteOp>,
    handle: JoinHandle<()>,
}

impl StoreWriter {
    /// Spawn the writer over a store clone.
    pub fn spawn(store: CoachStore) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(run_writer(store, rx));
        Self { tx, handle }
    }

    /// Queue an op. Waits only when the channel is full.
    pub async fn enqueue(&self, op: WriteOp) {
        if self.tx.send(op).await.is_err() {
            warn!("writer task is gone, dropping write");
        }
    }

    /// A cloneable sender for handing to worker tasks.
    pub fn sender(&self) -> mpsc::Sender<WriteOp> {
        self.tx.clone()
    }

    /// Close the channel and wait for the tail batch to flush.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}

async fn run_writer(store: CoachStore, mut rx: mpsc::Receiver<WriteOp>) {
    tracing::info!("store writer started");

    let mut batch: Vec<WriteOp> = Vec::new();
    let mut tick = time::interval(FLUSH_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            op = rx.recv() => {
                match op {
                    Some(op) => {
                        batch.push(op);
                        if batch.len() >= MAX_PENDING {
                            flush(&store, &mut batch).await;
                        }
                    }
                    None => {
                        flush(&store, &mut batch).await;
                        break;
                    }
                }
            }

            _ = tick.tick(), if !batch.is_empty() => {
                flush(&store, &mut batch).await;
            }
        }
    }

    tracing::info!("store writer exited");
}

async fn flush(store: &CoachStore, batch: &mut Vec<WriteOp>) {
    for op in batch.drain(..) {
        let result = match op {
            WriteOp::Position(board) => store.positions().upsert(&board).await,
            WriteOp::Note { key, text } => store.annotations().upsert(&key, &text).await,
            WriteOp::Outcome {
                from,
                mv,
                to,
                outcome,
            } => store
                .move_graph()
                .record_outcome(&from, mv, &to, outcome)
                .await
                .map(|_| ()),
            WriteOp::Game(game) => store.games().append(&game).await.map(|_| ()),
        };
        if let Err(e) = result {
            warn!(error = %e, "dropped deferred write");
        }
    }
}
