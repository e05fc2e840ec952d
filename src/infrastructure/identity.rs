use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;

/// User resolved from a bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("access token rejected")]
    Rejected,

    #[error("identity provider unreachable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, IdentityError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError>;
}

/// Supabase auth REST API.
#[derive(Clone)]
pub struct SupabaseIdentity {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseIdentity {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }
}

fn unavailable(e: reqwest::Error) -> IdentityError {
    IdentityError::Unavailable(e.to_string())
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify(&self, token: &str) -> Result<AuthUser, IdentityError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            status if status.is_success() => response.json::<AuthUser>().await.map_err(unavailable),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(IdentityError::Rejected)
            }
            status => Err(IdentityError::Unavailable(format!(
                "unexpected status {} from /auth/v1/user",
                status
            ))),
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let response = self
            .client
            .delete(format!("{}/auth/v1/admin/users/{}", self.base_url, user_id))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(unavailable)?;

        if response.status().is_success() {
            tracing::info!(%user_id, "Deleted user account");
            Ok(())
        } else {
            Err(IdentityError::Unavailable(format!(
                "account deletion failed with status {}",
                response.status()
            )))
        }
    }
}
