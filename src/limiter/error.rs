use super::store::StoreError;

/// Infrastructure failure while deciding admission. Never means "allowed".
#[derive(Debug, thiserror::Error)]
pub enum LimiterError {
    #[error("limiter storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("limiter actor for `{0}` is unreachable")]
    Unreachable(String),

    #[error("limiter registry is saturated with {0} busy actors")]
    Saturated(usize),
}
