use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use shopping_list_backend::{
    AppState,
    config::{Config, LimiterStoreKind},
    infrastructure::{GeminiClient, SupabaseIdentity, WebPageReader},
    limiter::{
        ActorRegistry, Clock, LimiterStore, MemoryLimiterStore, PgLimiterStore,
        RedisLimiterStore, SystemClock,
    },
    middleware::KeyRouter,
    router::create_router,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'shopping_list_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn LimiterStore> = match config.rate_limit_store {
        LimiterStoreKind::Postgres => Arc::new(PgLimiterStore::new(pool.clone())),
        LimiterStoreKind::Redis => {
            let client = redis::Client::open(config.redis_url.clone())
                .expect("Failed to create Redis client");
            Arc::new(RedisLimiterStore::new(
                client,
                clock.clone(),
                config.rate_limit_idle_ttl(),
            ))
        }
        LimiterStoreKind::Memory => {
            tracing::warn!("Rate limit state is kept in memory and will not survive restarts");
            Arc::new(MemoryLimiterStore::new())
        }
    };
    tracing::info!(store = ?config.rate_limit_store, "Rate limiter store selected");

    let registry = Arc::new(ActorRegistry::new(
        store,
        clock,
        config.registry_config(),
    ));
    let _sweeper = registry.spawn_sweeper(config.rate_limit_sweep_period());
    let key_router = Arc::new(KeyRouter::new(registry, &config));

    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client");

    let state = AppState {
        pool,
        identity: Arc::new(SupabaseIdentity::new(http.clone(), &config)),
        generator: Arc::new(GeminiClient::new(http.clone(), &config)),
        pages: Arc::new(WebPageReader::new(http)),
        config: config.clone(),
    };

    let app = create_router(state, key_router);

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
