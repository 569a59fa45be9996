//! Credential verification and the refresh-token session lifecycle
//!
//! Session states: unauthenticated, authenticated after login, rotated on
//! every refresh, and back to unauthenticated on logout. Each user has at
//! most one live refresh token: the value stored on the user record. A
//! refresh token that is validly signed but no longer equal to the stored
//! value (superseded by a later login/refresh, or cleared by logout) is
//! rejected.
//!
//! The refresh read-verify-write is not transactional. Two concurrent
//! refreshes for the same user race and the last write wins; the loser's
//! new token is simply never accepted.

use crate::auth::{JwtService, PasswordService, Subject, TokenPair};
use crate::error::ApiError;
use crate::repositories::{UserRecord, UserStore};
use tracing::{debug, info, warn};
use uuid::Uuid;
use videotube_shared::AuthError;

/// Log why a session check failed and answer with a plain 401
fn reject(reason: AuthError, message: &str) -> ApiError {
    debug!(%reason, "Session check failed");
    ApiError::Unauthorized(message.to_string())
}

pub struct SessionService;

impl SessionService {
    /// Look up the user whose username or email matches and check the password
    ///
    /// Either key may be blank. `NotFound` when no user matches,
    /// `Unauthorized` on a wrong password.
    pub async fn verify_credentials(
        store: &dyn UserStore,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, ApiError> {
        let username = username.trim().to_lowercase();
        let email = email.trim().to_lowercase();

        let user = store
            .find_by_username_or_email(&username, &email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;

        let valid =
            PasswordService::verify_async(password.to_string(), user.password_hash.clone())
                .await
                .map_err(ApiError::Internal)?;

        if !valid {
            warn!(user_id = %user.id, reason = %AuthError::InvalidCredentials, "Login rejected");
            return Err(ApiError::Unauthorized("Invalid user credentials".to_string()));
        }

        Ok(user)
    }

    /// Store `refresh_token` as the user's only live session
    pub async fn record_session(
        store: &dyn UserStore,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<(), ApiError> {
        store.set_refresh_token(user_id, Some(refresh_token)).await?;
        Ok(())
    }

    /// Forget the user's refresh token; clearing twice is harmless
    pub async fn clear_session(store: &dyn UserStore, user_id: Uuid) -> Result<(), ApiError> {
        store.set_refresh_token(user_id, None).await?;
        Ok(())
    }

    /// Mint a token pair and make its refresh token the live session
    pub async fn start_session(
        store: &dyn UserStore,
        jwt: &JwtService,
        user: &UserRecord,
    ) -> Result<TokenPair, ApiError> {
        let tokens = jwt.issue_token_pair(user).map_err(ApiError::Internal)?;
        Self::record_session(store, user.id, &tokens.refresh_token).await?;
        Ok(tokens)
    }

    /// Resolve an access token to a live user
    ///
    /// Every failure (missing, malformed, expired, bad signature, deleted
    /// user) is the same `Unauthorized` to the caller.
    pub async fn authenticate(
        store: &dyn UserStore,
        jwt: &JwtService,
        token: Option<&str>,
    ) -> Result<UserRecord, ApiError> {
        let token = token.ok_or_else(|| reject(AuthError::MissingToken, "Unauthorized request"))?;

        let claims = jwt
            .validate_access_token(token)
            .map_err(|e| reject(e, "Invalid access token"))?;
        let user_id = claims
            .user_id()
            .map_err(|e| reject(e, "Invalid access token"))?;

        store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| reject(AuthError::InvalidToken, "Invalid access token"))
    }

    /// Exchange the live refresh token for a new pair
    ///
    /// The presented token must verify against the refresh secret and be
    /// byte-for-byte the value currently stored for its user.
    pub async fn refresh_session(
        store: &dyn UserStore,
        jwt: &JwtService,
        refresh_token: Option<&str>,
    ) -> Result<(UserRecord, TokenPair), ApiError> {
        let refresh_token = refresh_token
            .ok_or_else(|| reject(AuthError::MissingToken, "Unauthorized request"))?;

        let claims = jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| reject(e, "Invalid refresh token"))?;
        let user_id = claims
            .user_id()
            .map_err(|e| reject(e, "Invalid refresh token"))?;

        let user = store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| reject(AuthError::InvalidToken, "Invalid refresh token"))?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            warn!(user_id = %user.id, "Refresh rejected: token superseded or cleared");
            let reason = AuthError::RefreshTokenReused;
            return Err(reject(reason, &reason.to_string()));
        }

        let tokens = Self::start_session(store, jwt, &user).await?;
        info!(user_id = %user.id, "Session rotated");

        Ok((user, tokens))
    }
}
