//! Request extractors whose rejections use the response envelope

use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
};
use tracing::debug;

/// `axum::Json` with failures rendered as envelopes
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "JSON body rejected");

        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::BadRequest("Content-Type must be application/json".to_string())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::PayloadTooLarge("Request body is too large".to_string())
            }
            _ => ApiError::BadRequest("Invalid JSON body".to_string()),
        }
    }
}
