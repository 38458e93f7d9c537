use axum::{
    Json, Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod budgets;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod insights;
pub mod logging;
pub mod models;
pub mod state;
pub mod token;
pub mod transactions;
pub mod users;
pub mod utils;

use crate::config::Config;
use crate::constants::API_PREFIX;
use crate::state::AppState;

/// All `/api` routes. Everything except auth and health sits behind the bearer-token guard.
pub fn api_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/user/me", get(users::me).put(users::update_settings))
        .route(
            "/user/settings",
            get(users::me).put(users::update_settings),
        )
        .route(
            "/transactions",
            post(transactions::create_transaction).get(transactions::get_transactions),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/budgets",
            post(budgets::create_budget).get(budgets::get_budgets),
        )
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/insights", get(insights::get_insights))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}

pub fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

pub fn app(state: AppState, config: &Config) -> Router {
    Router::new()
        .nest(API_PREFIX, api_router(state))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
