use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    config::Config,
    error::AppError,
    limiter::{ActorRegistry, RateLimitKey, RouteClass},
};

const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const DEFAULT_TRUSTED_HEADER: HeaderName = HeaderName::from_static("cf-connecting-ip");

/// Maps requests to rate-limit keys and asks the key's actor for admission.
pub struct KeyRouter {
    registry: Arc<ActorRegistry>,
    trusted_header: HeaderName,
    generate_prefix: String,
}

impl KeyRouter {
    pub fn new(registry: Arc<ActorRegistry>, config: &Config) -> Self {
        let trusted_header = HeaderName::from_bytes(config.trusted_ip_header.as_bytes())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid TRUSTED_IP_HEADER {:?}, using {}",
                    config.trusted_ip_header,
                    DEFAULT_TRUSTED_HEADER
                );
                DEFAULT_TRUSTED_HEADER
            });

        Self {
            registry,
            trusted_header,
            generate_prefix: config.generate_route_prefix(),
        }
    }

    pub fn registry(&self) -> &Arc<ActorRegistry> {
        &self.registry
    }

    /// Client address: trusted proxy header, then the first forwarded-for
    /// hop, then the TCP peer.
    pub fn client_address(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
        header_address(headers, &self.trusted_header)
            .or_else(|| header_address(headers, &FORWARDED_FOR))
            .or_else(|| peer.map(|addr| addr.ip()))
            .map(|ip| ip.to_canonical())
    }

    pub fn key_for(&self, address: IpAddr, path: &str) -> RateLimitKey {
        RateLimitKey::new(address, RouteClass::for_path(path, &self.generate_prefix))
    }

    pub async fn check(
        &self,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
        path: &str,
    ) -> Result<(), AppError> {
        let address = self
            .client_address(headers, peer)
            .ok_or(AppError::MissingClientIdentity)?;
        let key = self.key_for(address, path);

        let wait_ms = self.registry.time_to_wait(&key).await?;
        if wait_ms > 0 {
            tracing::info!(%key, wait_ms, "Rate limit exceeded");
            return Err(AppError::RateLimited { wait_ms });
        }
        Ok(())
    }
}

fn header_address(headers: &HeaderMap, name: &HeaderName) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
}

pub async fn rate_limit(
    State(router): State<Arc<KeyRouter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);

    router.check(req.headers(), peer, req.uri().path()).await?;

    Ok(next.run(req).await)
}
