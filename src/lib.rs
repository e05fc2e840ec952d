use std::sync::Arc;

use config::Config;
use infrastructure::{IdentityProvider, ListGenerator, PageReader};
use sqlx::PgPool;

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod limiter;
pub mod middleware;
pub mod router;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub identity: Arc<dyn IdentityProvider>,
    pub generator: Arc<dyn ListGenerator>,
    pub pages: Arc<dyn PageReader>,
}
