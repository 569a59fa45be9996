//! Access and refresh token issuance and validation
//!
//! Each token class has its own secret and lifetime. Keys are derived once
//! at startup and shared behind `Arc`.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use videotube_shared::AuthError;

use crate::repositories::UserRecord;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
    /// Random per-token ID; two tokens minted in the same second still differ
    pub jti: String,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user ID)
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Something carrying a user id as its subject
pub trait Subject {
    fn sub(&self) -> &str;

    /// Parse the subject as a user id
    fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(self.sub()).map_err(|_| AuthError::InvalidToken)
    }
}

impl Subject for AccessClaims {
    fn sub(&self) -> &str {
        &self.sub
    }
}

impl Subject for RefreshClaims {
    fn sub(&self) -> &str {
        &self.sub
    }
}

/// Freshly minted access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Encoding/decoding keys for one secret
#[derive(Clone)]
struct KeyPair {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl KeyPair {
    fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// Token issuer and verifier
///
/// Pure function of identity, secrets and clock; persistence of the refresh
/// token is the session service's job.
#[derive(Clone)]
pub struct JwtService {
    access: KeyPair,
    refresh: KeyPair,
    access_token_expiry_secs: i64,
    refresh_token_expiry_secs: i64,
    validation: Arc<Validation>,
}

impl JwtService {
    pub fn new(
        access_secret: &str,
        access_token_expiry_secs: i64,
        refresh_secret: &str,
        refresh_token_expiry_secs: i64,
    ) -> Self {
        let mut validation = Validation::default();
        // Expiry is exact; issued lifetimes are long enough that skew does not matter
        validation.leeway = 0;

        Self {
            access: KeyPair::new(access_secret),
            refresh: KeyPair::new(refresh_secret),
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            validation: Arc::new(validation),
        }
    }

    /// Mint an access token for a user
    pub fn generate_access_token(&self, user: &UserRecord) -> Result<String> {
        let (iat, exp) = self.window(self.access_token_expiry_secs);
        let claims = AccessClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.access.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to generate access token: {}", e))
    }

    /// Mint a refresh token for a user id
    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String> {
        let (iat, exp) = self.window(self.refresh_token_expiry_secs);
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.refresh.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to generate refresh token: {}", e))
    }

    /// Mint both tokens for a user
    pub fn issue_token_pair(&self, user: &UserRecord) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user.id)?,
        })
    }

    /// Verify signature and expiry of an access token
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.decode(token, &self.access.decoding)
    }

    /// Verify signature and expiry of a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.decode(token, &self.refresh.decoding)
    }

    pub fn access_token_expiry_secs(&self) -> i64 {
        self.access_token_expiry_secs
    }

    pub fn refresh_token_expiry_secs(&self) -> i64 {
        self.refresh_token_expiry_secs
    }

    fn window(&self, expiry_secs: i64) -> (i64, i64) {
        let now = Utc::now();
        (now.timestamp(), (now + Duration::seconds(expiry_secs)).timestamp())
    }

    fn decode<T: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<T, AuthError> {
        decode::<T>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_service() -> JwtService {
        JwtService::new("test-access-secret", 3600, "test-refresh-secret", 864000)
    }

    fn test_user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice Liddell".to_string(),
            password_hash: String::new(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_carries_identity() {
        let service = create_test_service();
        let user = test_user();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let token = service.generate_refresh_token(user_id).unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.exp - claims.iat, 864000);
    }

    #[test]
    fn test_token_classes_do_not_cross_validate() {
        let service = create_test_service();
        let user = test_user();
        let pair = service.issue_token_pair(&user).unwrap();

        assert_eq!(
            service.validate_refresh_token(&pair.access_token).unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(
            service.validate_access_token(&pair.refresh_token).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_pairs_minted_back_to_back_differ() {
        let service = create_test_service();
        let user = test_user();

        let first = service.issue_token_pair(&user).unwrap();
        let second = service.issue_token_pair(&user).unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new("test-access-secret", -10, "test-refresh-secret", -10);
        let user = test_user();

        let access = service.generate_access_token(&user).unwrap();
        assert_eq!(
            service.validate_access_token(&access).unwrap_err(),
            AuthError::TokenExpired
        );

        let refresh = service.generate_refresh_token(user.id).unwrap();
        assert_eq!(
            service.validate_refresh_token(&refresh).unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new("other-access", 3600, "other-refresh", 3600);
        let verifier = create_test_service();
        let token = issuer.generate_access_token(&test_user()).unwrap();

        assert_eq!(
            verifier.validate_access_token(&token).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_garbage_never_validates(token in "[a-zA-Z0-9_.-]{0,120}") {
            let service = create_test_service();
            prop_assert!(service.validate_access_token(&token).is_err());
            prop_assert!(service.validate_refresh_token(&token).is_err());
        }
    }
}
