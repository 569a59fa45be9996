//! Authentication module
//!
//! Argon2 password hashing, dual-secret JWT access/refresh tokens, session
//! cookies and the request verifier.

pub mod cookie;
mod jwt;
mod middleware;
mod password;

pub use cookie::{CookieBuilder, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME};
pub use jwt::{AccessClaims, JwtService, RefreshClaims, Subject, TokenPair};
pub use middleware::{access_token_from_headers, auth_middleware, AuthUser};
pub use password::PasswordService;
