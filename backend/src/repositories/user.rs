//! User records and the store abstraction over them

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;
use videotube_shared::UserResponse;

/// User record from the store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view, without password hash or refresh token
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for creating a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

/// Store failure
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique field (`username` or `email`) is already taken
    #[error("duplicate {0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email",
                    _ => "username",
                };
                return StoreError::Conflict(field.to_string());
            }
        }
        StoreError::Backend(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations the auth core needs
///
/// Single-field writes (`set_refresh_token`, `update_password`) touch only
/// that column and never re-validate the rest of the record.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` on a duplicate username or email.
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    /// The user whose username equals `username` OR whose email equals `email`
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<UserRecord>>;

    /// Overwrite (`Some`) or clear (`None`) the stored refresh token
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> StoreResult<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;

    /// Update display name and email; `None` if the user does not exist
    async fn update_account(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> StoreResult<Option<UserRecord>>;

    /// Check the backing store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Release connections; called once on shutdown
    async fn close(&self);
}
