//! Route definitions for the VideoTube API
//!
//! This module organizes all API routes and applies middleware.

use crate::error::{envelope_bare_errors, ApiError};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::map_response,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

mod extract;
mod health;
mod users;


pub use extract::ApiJson;
pub use users::user_routes;

/// JSON and form bodies above this size are rejected
pub const BODY_LIMIT_BYTES: usize = 16 * 1024;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors.origin);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .nest("/api/v1", api_routes(state.clone()))
        .fallback(|| async { ApiError::NotFound("Route not found".to_string()) })
        // Apply middleware layers
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        // Outside the limit and timeout layers so their 413/408 get the envelope too
        .layer(map_response(envelope_bare_errors))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .nest("/users", users::user_routes(state))
}

/// Credentialed CORS for the configured browser origin
fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match origin.parse::<HeaderValue>() {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            warn!(origin, "Invalid CORS origin; cross-origin requests will be refused");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
