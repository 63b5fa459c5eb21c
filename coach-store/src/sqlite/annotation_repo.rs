//! SQLite-backed implementation of [`AnnotationRepository`].
//!
//! Notes live in a base table plus an FTS5 index. Every mutation keeps
//! both inside one transaction: an upsert logically removes the prior
//! indexed text and adds the new text, so a reader can never observe
//! the index disagreeing with the base table.

use othello::PositionKey;
use sqlx::SqlitePool;

use super::helpers::{decode_key, fts_quote};
use super::retry;
use crate::traits::AnnotationRepository;
use crate::StoreError;

pub struct SqliteAnnotationRepository {
    pool: SqlitePool,
}

impl SqliteAnnotationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn try_upsert(&self, key: &PositionKey, text: &str) -> Result<(), StoreError> {
        let key_text = key.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR REPLACE INTO notes (pos_key, text) VALUES (?, ?)")
            .bind(&key_text)
            .bind(text)
            .execute(&mut *tx)
            .await?;

        // Logical delete-then-insert against the index; never an
        // in-place edit.
        sqlx::query("DELETE FROM notes_fts WHERE pos_key = ?")
            .bind(&key_text)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO notes_fts (pos_key, text) VALUES (?, ?)")
            .bind(&key_text)
            .bind(text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn try_delete(&self, key: &PositionKey) -> Result<(), StoreError> {
        let key_text = key.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM notes WHERE pos_key = ?")
            .bind(&key_text)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM notes_fts WHERE pos_key = ?")
            .bind(&key_text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Cross-check the base table against the full-text index. A
    /// disagreement cannot arise from this module's transactions; if
    /// observed it is a fatal integrity error and the index must be
    /// rebuilt via [`Self::rebuild_index`].
    pub async fn verify_index(&self) -> Result<(), StoreError> {
        let (base,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes")
            .fetch_one(&self.pool)
            .await?;
        let (indexed,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes_fts")
            .fetch_one(&self.pool)
            .await?;
        if base != indexed {
            return Err(StoreError::IndexDesync(format!(
                "{base} base rows vs {indexed} indexed rows"
            )));
        }

        let (mismatched,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM notes n
            LEFT JOIN notes_fts f ON f.pos_key = n.pos_key AND f.text = n.text
            WHERE f.pos_key IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        if mismatched != 0 {
            return Err(StoreError::IndexDesync(format!(
                "{mismatched} rows differ between base and index"
            )));
        }
        Ok(())
    }

    /// Rebuild the full-text index from the base table.
    pub async fn rebuild_index(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM notes_fts").execute(&mut *tx).await?;
        sqlx::query("INSERT INTO notes_fts (pos_key, text) SELECT pos_key, text FROM notes")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!("annotation index rebuilt");
        Ok(())
    }
}

impl AnnotationRepository for SqliteAnnotationRepository {
    async fn upsert(&self, key: &PositionKey, text: &str) -> Result<(), StoreError> {
        retry::write(|| self.try_upsert(key, text)).await
    }

    async fn delete(&self, key: &PositionKey) -> Result<(), StoreError> {
        retry::write(|| self.try_delete(key)).await
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<PositionKey>, StoreError> {
        let quoted = fts_quote(query);
        if quoted.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT pos_key FROM notes_fts WHERE notes_fts MATCH ? ORDER BY rank LIMIT ?",
        )
        .bind(quoted)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|(key,)| decode_key(key)).collect()
    }

    async fn get(&self, key: &PositionKey) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT text FROM notes WHERE pos_key = ?")
            .bind(key.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(text,)| text))
    }
}
