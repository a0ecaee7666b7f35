//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (request ids, CORS,
//! compression, tracing), and creates the axum router ready for serving.

use axum::{
    extract::Request,
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::request_id::{self, REQUEST_ID_HEADER};
use super::state::AppState;
use crate::routes::analytics::FARM_ANALYTICS_PATH;
use crate::routes::farms::FARM_SECTORS_PATH;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([REQUEST_ID_HEADER]);

    let api_v1 = Router::new()
        .route(FARM_ANALYTICS_PATH, get(handlers::get_irrigation_analytics))
        .route(FARM_SECTORS_PATH, get(handlers::list_sectors));

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(trace)
        // Outside the trace layer so the span sees the id.
        .layer(middleware::from_fn(request_id::add_request_id))
        .layer(cors)
        .with_state(state)
}
