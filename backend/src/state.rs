//! Application state
//!
//! The process-wide context handed to every handler. It is built once
//! before the server binds (`connect`), cloned per request, and torn down
//! after graceful shutdown (`shutdown`).

use crate::auth::{CookieBuilder, JwtService};
use crate::config::AppConfig;
use crate::db;
use crate::repositories::{MemoryUserStore, PgUserStore, UserStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Database URL scheme selecting the in-process store
pub const MEMORY_STORE_URL: &str = "memory://";

/// Shared application state
///
/// All fields are cheap to clone: the store and config sit behind `Arc`,
/// and the JWT keys are pre-computed and `Arc`'d inside `JwtService`.
#[derive(Clone)]
pub struct AppState {
    users: Arc<dyn UserStore>,
    config: Arc<AppConfig>,
    jwt: JwtService,
    cookies: CookieBuilder,
}

impl AppState {
    /// Assemble state around an already-open user store
    pub fn new(users: Arc<dyn UserStore>, config: AppConfig) -> Self {
        let jwt = JwtService::new(
            &config.jwt.access_secret,
            config.jwt.access_token_expiry_secs,
            &config.jwt.refresh_secret,
            config.jwt.refresh_token_expiry_secs,
        );
        let cookies = CookieBuilder::new(config.cookies.secure);

        Self {
            users,
            config: Arc::new(config),
            jwt,
            cookies,
        }
    }

    /// Open the configured store (connecting and migrating Postgres)
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let users: Arc<dyn UserStore> = if config.database.url.starts_with(MEMORY_STORE_URL) {
            warn!("Using the in-memory user store; data is lost on restart");
            Arc::new(MemoryUserStore::new())
        } else {
            info!("Connecting to database...");
            let pool = db::create_pool(&config.database).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgUserStore::new(pool))
        };

        Ok(Self::new(users, config))
    }

    /// Release the store's connections
    pub async fn shutdown(&self) {
        self.users.close().await;
    }

    #[inline]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn cookies(&self) -> &CookieBuilder {
        &self.cookies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_with_memory_store() {
        let mut config = AppConfig::default();
        config.database.url = MEMORY_STORE_URL.to_string();

        let state = AppState::connect(config).await.unwrap();
        assert!(state.users().ping().await.is_ok());

        let _cloned = state.clone();
        state.shutdown().await;
    }

    #[test]
    fn test_jwt_uses_configured_lifetimes() {
        let config = AppConfig::default();
        let access = config.jwt.access_token_expiry_secs;
        let state = AppState::new(Arc::new(MemoryUserStore::new()), config);

        assert_eq!(state.jwt().access_token_expiry_secs(), access);
    }
}
