use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{LimiterStore, StoreError};

/// Process-local store. State is lost on restart, which the limiter
/// tolerates: a missing row reads as "no prior restriction".
#[derive(Debug, Default)]
pub struct MemoryLimiterStore {
    rows: DashMap<String, i64>,
    failing: AtomicBool,
    schema_calls: AtomicUsize,
}

impl MemoryLimiterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.rows.get(key).map(|row| *row)
    }

    /// Makes every subsequent operation fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LimiterStore for MemoryLimiterStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.check_available()?;
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.check_available()?;
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, next_allowed_time: i64) -> Result<(), StoreError> {
        self.check_available()?;
        self.rows.insert(key.to_string(), next_allowed_time);
        Ok(())
    }
}
