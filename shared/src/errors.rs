//! Error types for the VideoTube application

use thiserror::Error;

/// Authentication failure kinds
///
/// The distinction is kept for logging; clients only ever see
/// "unauthorized".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing token")]
    MissingToken,

    #[error("Refresh token is expired or used")]
    RefreshTokenReused,
}
