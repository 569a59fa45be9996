//! Session cookies
//!
//! `accessToken` and `refreshToken` are `HttpOnly`, path-wide, and `Secure`
//! unless disabled for plain-http development.

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};

pub const ACCESS_COOKIE_NAME: &str = "accessToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Read a cookie value from the request headers
///
/// Looks through every `Cookie` header; the first non-empty match wins.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Builds `Set-Cookie` values with the configured attributes
#[derive(Debug, Clone, Copy)]
pub struct CookieBuilder {
    secure: bool,
}

impl CookieBuilder {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// Cookie carrying `value` that expires after `max_age_secs`
    pub fn session(&self, name: &str, value: &str, max_age_secs: i64) -> HeaderValue {
        self.build(name, value, max_age_secs.max(0))
    }

    /// Cookie that tells the browser to drop `name`
    pub fn clear(&self, name: &str) -> HeaderValue {
        self.build(name, "", 0)
    }

    fn build(&self, name: &str, value: &str, max_age_secs: i64) -> HeaderValue {
        let mut cookie = format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            name, value, max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        // JWTs are base64url with dots, always a valid header value
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}
