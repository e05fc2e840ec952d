use super::key::RouteClass;

/// Request spacing and tolerated early arrival, both in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub interval_ms: i64,
    pub grace_ms: i64,
}

impl LimiterConfig {
    pub const DEFAULT: LimiterConfig = LimiterConfig {
        interval_ms: 1,
        grace_ms: 5000,
    };

    /// One generation every 10 seconds.
    pub const GENERATE: LimiterConfig = LimiterConfig {
        interval_ms: 10_000,
        grace_ms: 1000,
    };

    pub fn for_route(route_class: RouteClass) -> Self {
        match route_class {
            RouteClass::Default => Self::DEFAULT,
            RouteClass::Generate => Self::GENERATE,
        }
    }
}
