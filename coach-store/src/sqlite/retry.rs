//! Bounded retry for transient write contention.
//!
//! WAL mode plus the connection busy timeout absorb most contention;
//! what leaks through (a write transaction losing the race for the
//! write lock) is retried here with a short backoff. Exhausted retries
//! surface as [`StoreError::ConcurrentWriteConflict`] — the store never
//! spins indefinitely behind a stuck writer.

use std::future::Future;
use std::time::Duration;

use crate::StoreError;

const MAX_WRITE_ATTEMPTS: u32 = 5;
const BACKOFF_STEP: Duration = Duration::from_millis(20);

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended
/// codes, mark a serialization failure worth retrying.
pub(crate) fn is_transient_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<u32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
        _ => false,
    }
}

/// Run a write operation, retrying on transient lock contention.
pub(crate) async fn write<T, F, Fut>(mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(StoreError::Sqlx(err)) if is_transient_conflict(&err) => {
                if attempt >= MAX_WRITE_ATTEMPTS {
                    tracing::warn!(attempts = attempt, "write retries exhausted");
                    return Err(StoreError::ConcurrentWriteConflict { attempts: attempt });
                }
                tokio::time::sleep(BACKOFF_STEP * attempt).await;
                attempt += 1;
            }
            Err(other) => return Err(other),
        }
    }
}
