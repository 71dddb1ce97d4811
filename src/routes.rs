use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers;
use crate::AppState;

/// Listing routes, gated by basic auth when credentials are configured
pub fn file_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/files.html", get(handlers::get_listing))
        .route_layer(middleware::from_fn_with_state(state, auth::basic_auth))
}

/// Full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check stays open
        .route("/health", get(handlers::health))
        .merge(file_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
