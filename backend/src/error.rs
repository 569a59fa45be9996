//! Application error handling
//!
//! Every failure is rendered as the standard response envelope with
//! `success: false` and `data: null`. Internal details are logged, never
//! returned.

use crate::repositories::StoreError;
use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;
use videotube_shared::validation::ValidationError;
use videotube_shared::ApiResponse;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg) => msg.clone(),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                "Something went wrong".to_string()
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                "Something went wrong".to_string()
            }
        }
    }

    /// Shorthand for the generic unauthorized rejection
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized request".to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.user_message())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => {
                ApiError::Conflict(format!("User with this {} already exists", field))
            }
            StoreError::Backend(err) => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ApiResponse::new(
            status.as_u16(),
            serde_json::Value::Null,
            self.public_message(),
        ));

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Rewrite bodyless or non-JSON error responses into the envelope
///
/// Covers what the framework and tower layers answer on their own (405,
/// 408, 413). The status and other headers are kept.
pub async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json {
        return response;
    }

    let message = status.canonical_reason().unwrap_or("Request failed");
    let body = ApiResponse::new(status.as_u16(), serde_json::Value::Null, message);
    let bytes = match serde_json::to_vec(&body) {
        Ok(bytes) => bytes,
        Err(_) => return response,
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_ENCODING);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST)]
    #[case(ApiError::Validation("x".into()), StatusCode::BAD_REQUEST)]
    #[case(ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED)]
    #[case(ApiError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(ApiError::Conflict("x".into()), StatusCode::CONFLICT)]
    #[case(ApiError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE)]
    fn test_status_mapping(#[case] error: ApiError, #[case] expected: StatusCode) {
        assert_eq!(error.into_response().status(), expected);
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = ApiError::Unauthorized("Invalid user credentials".to_string()).into_response();
        let body = body_json(response).await;

        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid user credentials");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response =
            ApiError::Internal(anyhow::anyhow!("connection refused at 10.0.0.5")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        let message = body["message"].as_str().unwrap();
        assert!(!message.contains("10.0.0.5"));
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_bare_error_is_wrapped_in_envelope() {
        let bare = Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(header::ALLOW, "POST")
            .body(Body::empty())
            .unwrap();

        let response = envelope_bare_errors(bare).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 405);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_json_errors_and_successes_pass_through() {
        let enveloped = envelope_bare_errors(ApiError::NotFound("gone".into()).into_response()).await;
        assert_eq!(body_json(enveloped).await["message"], "gone");

        let ok = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Body::empty())
            .unwrap();
        let response = envelope_bare_errors(ok).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_store_conflict_maps_to_409() {
        let err: ApiError = StoreError::Conflict("username".to_string()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
