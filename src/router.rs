use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    config::Config,
    middleware::{KeyRouter, auth_middleware, log_errors, rate_limit},
    routes::{account, category, generate, health, item, list, list_item},
};

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/items", get(item::list_items).post(item::create_item))
        .route(
            "/items/{id}",
            get(item::get_item)
                .put(item::update_item)
                .delete(item::delete_item),
        )
        .route(
            "/categories",
            get(category::list_categories).post(category::create_category),
        )
        .route("/categories/{id}", delete(category::delete_category))
        .route("/lists", get(list::list_lists).post(list::create_list))
        .route(
            "/lists/{id}",
            put(list::update_list).delete(list::delete_list),
        )
        .route("/listItems", post(list_item::add_list_item))
        .route(
            "/listItems/{id}",
            get(list_item::get_list_items)
                .put(list_item::update_list_item)
                .delete(list_item::delete_list_item),
        )
        .route("/generate/{method}", post(generate::generate_list))
        .route("/auth/delete", delete(account::delete_account))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::RETRY_AFTER]);

    if config.frontend_origin == "*" {
        return cors.allow_origin(Any);
    }
    match config.frontend_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(
                "Invalid FRONTEND_ORIGIN {:?}, cross-origin requests will be refused",
                config.frontend_origin
            );
            cors
        }
    }
}

/// Builds the application. Everything under the API base is rate limited;
/// `/health` is not.
pub fn create_router(state: AppState, key_router: Arc<KeyRouter>) -> Router {
    let base = state.config.api_base_uri.clone();
    let api = api_routes(&state);

    let api = if base == "/" {
        Router::new().merge(api)
    } else {
        Router::new().nest(&base, api)
    };

    let limited = api
        .layer(from_fn(log_errors))
        .layer(from_fn_with_state(key_router, rate_limit));

    Router::new()
        .route("/health", get(health::health))
        .merge(limited)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}
