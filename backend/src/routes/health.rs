//! Health check endpoints
//!
//! - /api/v1/healthcheck - Store round trip, answered in the response envelope
//! - /health - Basic health check (no dependency checks)
//! - /health/live - Liveness probe (OK while the process serves requests)
//! - /health/ready - Readiness probe (503 when the store is unreachable)

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use videotube_shared::ApiResponse;

/// Probe response
#[derive(Serialize)]
pub struct ProbeResponse {
    pub status: &'static str,
    pub version: &'static str,
}

fn probe(status: &'static str) -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/v1/healthcheck
pub async fn healthcheck(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<&'static str>>> {
    state.users().ping().await.map_err(ApiError::from)?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.as_u16(),
        "OK",
        "Server is up and running",
    )))
}

/// GET /health
pub async fn health_check() -> Json<ProbeResponse> {
    probe("healthy")
}

/// GET /health/live
pub async fn liveness_check() -> Json<ProbeResponse> {
    probe("alive")
}

/// GET /health/ready
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ProbeResponse>, (StatusCode, Json<ProbeResponse>)> {
    match state.users().ping().await {
        Ok(()) => Ok(probe("ready")),
        Err(_) => Err((StatusCode::SERVICE_UNAVAILABLE, probe("not_ready"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let response = liveness_check().await;
        assert_eq!(response.status, "alive");
        assert!(!response.version.is_empty());
    }
}
