use async_trait::async_trait;
use sqlx::PgPool;

use super::{LimiterStore, StoreError};

/// Limiter state in the application's Postgres database, table `limit_state`.
#[derive(Clone)]
pub struct PgLimiterStore {
    pool: PgPool,
}

impl PgLimiterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LimiterStore for PgLimiterStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS limit_state (
                key TEXT PRIMARY KEY,
                next_allowed_time BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let value = sqlx::query_scalar::<_, i64>(
            "SELECT next_allowed_time FROM limit_state WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn save(&self, key: &str, next_allowed_time: i64) -> Result<(), StoreError> {
        // GREATEST keeps the row monotonic even if another process shares the table.
        sqlx::query(
            r#"
            INSERT INTO limit_state (key, next_allowed_time)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
            SET next_allowed_time = GREATEST(limit_state.next_allowed_time, EXCLUDED.next_allowed_time)
            "#,
        )
        .bind(key)
        .bind(next_allowed_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
