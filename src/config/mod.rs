use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::limiter::RegistryConfig;

/// Backend holding the per-key limiter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimiterStoreKind {
    #[default]
    Postgres,
    Redis,
    Memory,
}

impl FromStr for LimiterStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown rate limit store `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub frontend_origin: String,
    pub trusted_ip_header: String,
    pub rate_limit_store: LimiterStoreKind,
    pub redis_url: String,
    pub rate_limit_max_actors: usize,
    pub rate_limit_idle_secs: u64,
    pub rate_limit_sweep_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/shopping_list".into(),
            supabase_url: "http://localhost:54321".into(),
            supabase_anon_key: String::new(),
            supabase_service_key: String::new(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-1.5-flash".into(),
            server_host: "::".into(),
            server_port: 3000,
            api_base_uri: "/api/v1".into(),
            frontend_origin: "*".into(),
            trusted_ip_header: "cf-connecting-ip".into(),
            rate_limit_store: LimiterStoreKind::Postgres,
            redis_url: "redis://127.0.0.1/".into(),
            rate_limit_max_actors: 100_000,
            rate_limit_idle_secs: 300,
            rate_limit_sweep_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let defaults = Config::default();
        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            supabase_url: env::var("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")?,
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")?,
            gemini_api_key: env::var("GEMINI_API_KEY")?,
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            api_base_uri: env::var("API_BASE_URI")
                .map(|uri| normalize_base_uri(&uri))
                .unwrap_or(defaults.api_base_uri),
            frontend_origin: env::var("FRONTEND_ORIGIN").unwrap_or(defaults.frontend_origin),
            trusted_ip_header: env::var("TRUSTED_IP_HEADER")
                .map(|h| h.trim().to_ascii_lowercase())
                .unwrap_or(defaults.trusted_ip_header),
            rate_limit_store: parse_or("RATE_LIMIT_STORE", defaults.rate_limit_store),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            rate_limit_max_actors: parse_or("RATE_LIMIT_MAX_ACTORS", defaults.rate_limit_max_actors),
            rate_limit_idle_secs: parse_or("RATE_LIMIT_IDLE_SECS", defaults.rate_limit_idle_secs),
            rate_limit_sweep_secs: parse_or("RATE_LIMIT_SWEEP_SECS", defaults.rate_limit_sweep_secs),
        })
    }

    /// Path prefix of the AI list-generation routes.
    pub fn generate_route_prefix(&self) -> String {
        format!("{}/generate", self.api_base_uri.trim_end_matches('/'))
    }

    pub fn rate_limit_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.rate_limit_idle_secs)
    }

    pub fn rate_limit_sweep_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_secs.max(1))
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            max_actors: self.rate_limit_max_actors,
            idle_ttl: self.rate_limit_idle_ttl(),
            ..RegistryConfig::default()
        }
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Leading slash, no trailing slash.
fn normalize_base_uri(uri: &str) -> String {
    let trimmed = uri.trim().trim_matches('/');
    format!("/{}", trimmed)
}
