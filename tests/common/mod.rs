#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use serde_json::Value;
use shopping_list_backend::{
    AppState,
    config::Config,
    infrastructure::{
        AuthUser, GenerationError, GenerationRequest, IdentityError, IdentityProvider,
        ListGenerator, PageError, PageReader,
    },
    limiter::{ActorRegistry, ManualClock, MemoryLimiterStore, RegistryConfig},
    middleware::KeyRouter,
    router::create_router,
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub const VALID_TOKEN: &str = "valid-token";
pub const PROVIDER_DOWN_TOKEN: &str = "provider-down";
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub fn test_user_id() -> Uuid {
    Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0001)
}

pub struct StubIdentity;

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn verify(&self, token: &str) -> Result<AuthUser, IdentityError> {
        match token {
            VALID_TOKEN => Ok(AuthUser {
                id: test_user_id(),
                email: Some("shopper@example.com".into()),
            }),
            PROVIDER_DOWN_TOKEN => Err(IdentityError::Unavailable("connection refused".into())),
            _ => Err(IdentityError::Rejected),
        }
    }

    async fn delete_user(&self, _user_id: Uuid) -> Result<(), IdentityError> {
        Ok(())
    }
}

pub struct StubGenerator;

#[async_trait]
impl ListGenerator for StubGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("no generator in tests".into()))
    }
}

/// Pages whose URL mentions "unreachable" fail to load.
pub struct StubPages;

#[async_trait]
impl PageReader for StubPages {
    async fn read_text(&self, url: &str) -> Result<String, PageError> {
        if url.contains("unreachable") {
            return Err(PageError::Unavailable("connection refused".into()));
        }
        Ok("Boil water\nAdd pasta".into())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryLimiterStore>,
    pub clock: Arc<ManualClock>,
}

/// Full application over an in-memory limiter store. The database pool is
/// lazy and never connects, so only requests that stop before a query are
/// usable here.
pub fn test_app() -> TestApp {
    let config = Config::default();
    let store = Arc::new(MemoryLimiterStore::new());
    let clock = Arc::new(ManualClock::new(START_MILLIS));

    let registry = Arc::new(ActorRegistry::new(
        store.clone(),
        clock.clone(),
        RegistryConfig::default(),
    ));
    let key_router = Arc::new(KeyRouter::new(registry, &config));

    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();

    let state = AppState {
        pool,
        config,
        identity: Arc::new(StubIdentity),
        generator: Arc::new(StubGenerator),
        pages: Arc::new(StubPages),
    };

    TestApp {
        router: create_router(state, key_router),
        store,
        clock,
    }
}

pub fn request(method: &str, uri: &str, client_ip: Option<&str>, token: Option<&str>) -> Request<Body> {
    request_with_body(method, uri, client_ip, token, None)
}

pub fn request_with_body(
    method: &str,
    uri: &str,
    client_ip: Option<&str>,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ip) = client_ip {
        builder = builder.header("cf-connecting-ip", ip);
    }
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const BOUNDARY: &str = "shopping-list-form-boundary";

pub enum FormPart<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Authenticated `multipart/form-data` POST to `uri`.
pub fn multipart_request(uri: &str, client_ip: Option<&str>, parts: &[FormPart<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File {
                name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"upload\"\r\nContent-Type: {}\r\n\r\n",
                        name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", VALID_TOKEN))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(ip) = client_ip {
        builder = builder.header("cf-connecting-ip", ip);
    }
    builder.body(Body::from(body)).unwrap()
}
