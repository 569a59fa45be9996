//! Account operations built on the session core
//!
//! Input checks run before any store write. Hashing and verification run
//! on the blocking thread pool.

use crate::auth::{JwtService, PasswordService, TokenPair};
use crate::error::ApiError;
use crate::repositories::{NewUser, UserRecord, UserStore};
use crate::services::SessionService;
use tracing::info;
use uuid::Uuid;
use validator::ValidateEmail;
use videotube_shared::validation::{
    check_change_password_fields, check_login_fields, check_register_fields,
    check_update_account_fields, validate_full_name, validate_password, validate_username,
};
use videotube_shared::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateAccountRequest};

/// Successful login: the user and the session tokens
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub tokens: TokenPair,
}

pub struct UserService;

impl UserService {
    /// Register a new account
    ///
    /// Order: missing fields (400), format (400), existing username/email
    /// (409), then insert. The unique indexes still catch a concurrent
    /// registration that slips between the check and the insert.
    pub async fn register(
        store: &dyn UserStore,
        req: &RegisterRequest,
    ) -> Result<UserRecord, ApiError> {
        check_register_fields(req)?;

        let full_name = req.full_name.as_deref().unwrap_or_default().trim();
        let username = req.username.as_deref().unwrap_or_default().trim().to_lowercase();
        let email = req.email.as_deref().unwrap_or_default().trim().to_lowercase();
        let password = req.password.as_deref().unwrap_or_default();

        validate_full_name(full_name).map_err(ApiError::Validation)?;
        validate_username(&username).map_err(ApiError::Validation)?;
        if !email.validate_email() {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }
        validate_password(password).map_err(ApiError::Validation)?;

        if store
            .find_by_username_or_email(&username, &email)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_async(password.to_string())
            .await
            .map_err(ApiError::Internal)?;

        let user = store
            .create(NewUser {
                username,
                email,
                full_name: full_name.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and start a new session
    pub async fn login(
        store: &dyn UserStore,
        jwt: &JwtService,
        req: &LoginRequest,
    ) -> Result<LoginOutcome, ApiError> {
        check_login_fields(req)?;
        let (username, email) = req
            .lookup_keys()
            .ok_or_else(|| ApiError::BadRequest("username or email is required".to_string()))?;
        let password = req.password.as_deref().unwrap_or_default();

        let user = SessionService::verify_credentials(store, username, email, password).await?;
        let tokens = SessionService::start_session(store, jwt, &user).await?;

        info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome { user, tokens })
    }

    /// End the caller's session
    pub async fn logout(store: &dyn UserStore, user_id: Uuid) -> Result<(), ApiError> {
        SessionService::clear_session(store, user_id).await?;
        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Replace the caller's password after checking the old one
    pub async fn change_password(
        store: &dyn UserStore,
        user_id: Uuid,
        req: &ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        check_change_password_fields(req)?;
        let old_password = req.old_password.as_deref().unwrap_or_default();
        let new_password = req.new_password.as_deref().unwrap_or_default();

        validate_password(new_password).map_err(ApiError::Validation)?;

        let user = store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;
        let valid =
            PasswordService::verify_async(old_password.to_string(), user.password_hash.clone())
                .await
                .map_err(ApiError::Internal)?;
        if !valid {
            return Err(ApiError::BadRequest("Invalid old password".to_string()));
        }

        let password_hash = PasswordService::hash_async(new_password.to_string())
            .await
            .map_err(ApiError::Internal)?;
        store.update_password(user.id, &password_hash).await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Update the caller's display name and email
    pub async fn update_account(
        store: &dyn UserStore,
        user_id: Uuid,
        req: &UpdateAccountRequest,
    ) -> Result<UserRecord, ApiError> {
        check_update_account_fields(req)?;
        let full_name = req.full_name.as_deref().unwrap_or_default().trim();
        let email = req.email.as_deref().unwrap_or_default().trim().to_lowercase();

        validate_full_name(full_name).map_err(ApiError::Validation)?;
        if !email.validate_email() {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }

        store
            .update_account(user_id, full_name, &email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))
    }
}
