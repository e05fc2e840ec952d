// Per-client admission control.
// Each rate-limit key is served by exactly one actor task that owns the
// key's persisted `next_allowed_time`.

pub mod actor;
pub mod clock;
pub mod config;
pub mod error;
pub mod key;
pub mod registry;
pub mod schedule;
pub mod store;

pub use actor::{ActorHandle, LimiterActor};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LimiterConfig;
pub use error::LimiterError;
pub use key::{RateLimitKey, RouteClass};
pub use registry::{ActorRegistry, RegistryConfig};
pub use schedule::{Admission, admit};
pub use store::{LimiterStore, MemoryLimiterStore, PgLimiterStore, RedisLimiterStore, StoreError};
