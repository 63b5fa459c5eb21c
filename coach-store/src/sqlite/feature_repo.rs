//! SQLite-backed implementation of [`FeatureRepository`].

use othello::PositionKey;
use sqlx::SqlitePool;

use crate::records::FeatureVector;
use crate::traits::FeatureRepository;
use crate::StoreError;

pub struct SqliteFeatureRepository {
    pool: SqlitePool,
}

impl SqliteFeatureRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FeatureRow {
    mobility: i64,
    pot_mobility: i64,
    frontier: i64,
    stability: i64,
    parity: i64,
    corners: i64,
    x_squares: i64,
    engine_ver: String,
    computed_at: i64,
}

impl From<FeatureRow> for FeatureVector {
    fn from(r: FeatureRow) -> Self {
        Self {
            mobility: r.mobility as i32,
            pot_mobility: r.pot_mobility as i32,
            frontier: r.frontier as i32,
            stability: r.stability as i32,
            parity: r.parity as i32,
            corners: r.corners as i32,
            x_squares: r.x_squares as i32,
            engine_ver: r.engine_ver,
            computed_at: r.computed_at as u64,
        }
    }
}

impl FeatureRepository for SqliteFeatureRepository {
    /// Wholesale replace — a vector computed by a newer engine version
    /// overwrites every column; partial updates are not possible.
    async fn put(&self, key: &PositionKey, vector: &FeatureVector) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO features
                (pos_key, mobility, pot_mobility, frontier, stability,
                 parity, corners, x_squares, engine_ver, computed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(key.to_string())
        .bind(vector.mobility as i64)
        .bind(vector.pot_mobility as i64)
        .bind(vector.frontier as i64)
        .bind(vector.stability as i64)
        .bind(vector.parity as i64)
        .bind(vector.corners as i64)
        .bind(vector.x_squares as i64)
        .bind(&vector.engine_ver)
        .bind(vector.computed_at as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &PositionKey) -> Result<Option<FeatureVector>, StoreError> {
        let row: Option<FeatureRow> = sqlx::query_as(
            r#"
            SELECT mobility, pot_mobility, frontier, stability, parity,
                   corners, x_squares, engine_ver, computed_at
            FROM features
            WHERE pos_key = ?
            "#,
        )
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FeatureVector::from))
    }
}
