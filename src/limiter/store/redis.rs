use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use super::{LimiterStore, StoreError};
use crate::limiter::Clock;

/// Limiter state as redis strings under `rate_limit:<key>`.
///
/// Each write expires `retention` after the stored instant has passed, which
/// is when the row stops restricting anything.
#[derive(Clone)]
pub struct RedisLimiterStore {
    client: redis::Client,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl RedisLimiterStore {
    pub fn new(client: redis::Client, clock: Arc<dyn Clock>, retention: Duration) -> Self {
        Self {
            client,
            clock,
            retention,
        }
    }

    fn redis_key(key: &str) -> String {
        format!("rate_limit:{}", key)
    }

    fn ttl_millis(&self, next_allowed_time: i64) -> u64 {
        let remaining = next_allowed_time - self.clock.now_millis();
        let remaining = u64::try_from(remaining).unwrap_or_default();
        let retention = u64::try_from(self.retention.as_millis()).unwrap_or(u64::MAX);
        remaining.saturating_add(retention).max(1)
    }
}

#[async_trait]
impl LimiterStore for RedisLimiterStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<i64> = conn.get(Self::redis_key(key)).await?;
        Ok(value)
    }

    async fn save(&self, key: &str, next_allowed_time: i64) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .pset_ex(
                Self::redis_key(key),
                next_allowed_time,
                self.ttl_millis(next_allowed_time),
            )
            .await?;
        Ok(())
    }
}
