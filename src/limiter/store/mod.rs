// Durable per-key limiter state.
// A store only holds `(storage key, next_allowed_time)` rows; the owning
// actor serializes every read/write pair for its key.

mod memory;
mod postgres;
mod redis;

use async_trait::async_trait;

pub use self::memory::MemoryLimiterStore;
pub use self::postgres::PgLimiterStore;
pub use self::redis::RedisLimiterStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LimiterStore: Send + Sync {
    /// Creates the backing table if needed. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Reads the persisted next allowed instant, `None` if never written.
    async fn load(&self, key: &str) -> Result<Option<i64>, StoreError>;

    async fn save(&self, key: &str, next_allowed_time: i64) -> Result<(), StoreError>;
}
