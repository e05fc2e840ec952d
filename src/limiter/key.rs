use std::fmt;
use std::net::IpAddr;

/// Suffix appended to the address when serializing a generate-route key.
const GENERATE_SUFFIX: &str = "_generate_limit";

/// Classification of the request path, selects the limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Default,
    /// AI-backed list generation.
    Generate,
}

impl RouteClass {
    /// `Generate` when `path` is the generate prefix itself or lies below it.
    pub fn for_path(path: &str, generate_prefix: &str) -> Self {
        let prefix = generate_prefix.trim_end_matches('/');
        match path.strip_prefix(prefix) {
            Some(rest) if !prefix.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
                RouteClass::Generate
            }
            _ => RouteClass::Default,
        }
    }
}

/// Identity of a throttled entity: one client address within one route class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub address: IpAddr,
    pub route_class: RouteClass,
}

impl RateLimitKey {
    pub fn new(address: IpAddr, route_class: RouteClass) -> Self {
        Self {
            address,
            route_class,
        }
    }

    /// Key under which the limiter state is persisted.
    pub fn storage_key(&self) -> String {
        match self.route_class {
            RouteClass::Default => self.address.to_string(),
            RouteClass::Generate => format!("{}{}", self.address, GENERATE_SUFFIX),
        }
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
