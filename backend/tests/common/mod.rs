//! Common test utilities for integration tests
//!
//! `TestApp` drives the full router through `tower::ServiceExt::oneshot`
//! against the in-memory store, so these tests need no database.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use videotube_backend::{
    config::AppConfig, repositories::MemoryUserStore, routes, state::AppState,
};

pub const PASSWORD: &str = "correct-password";

/// Response pieces the tests look at
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
}

impl TestResponse {
    /// Value of a cookie set by this response
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookies.iter().find_map(|c| {
            let (pair, _) = c.split_once(';').unwrap_or((c.as_str(), ""));
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryUserStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::new(store.clone(), config);
        let app = routes::create_router(state.clone());

        Self { app, state, store }
    }

    /// Send a request with optional JSON body and extra headers
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, String)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            set_cookies,
            body,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), &[]).await
    }

    /// Register `username` with the shared test password
    pub async fn register(&self, username: &str) -> TestResponse {
        self.post(
            "/api/v1/users/register",
            json!({
                "fullName": format!("{} Tester", username),
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
            }),
        )
        .await
    }

    /// Log `username` in with the shared test password
    pub async fn login(&self, username: &str) -> TestResponse {
        self.post(
            "/api/v1/users/login",
            json!({ "username": username, "password": PASSWORD }),
        )
        .await
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn cookie(name: &str, value: &str) -> (&'static str, String) {
    ("Cookie", format!("{}={}", name, value))
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.jwt.access_secret = "test-access-secret-key-for-testing-only".to_string();
    config.jwt.refresh_secret = "test-refresh-secret-key-for-testing-only".to_string();
    config.jwt.access_token_expiry_secs = 3600;
    config.jwt.refresh_token_expiry_secs = 86400;
    config
}
