//! Authentication service
//!
//! Business logic for registration, login, logout, and token refresh.
//! Coordinates the user repository and the JWT service; the stored
//! refresh token on the user row is the single source of truth for
//! which refresh token is currently valid.

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::db::repositories::UserRepository;
use crate::core::error::ApiError;

/// Tokens and display name handed back after register/login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub name: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(user_repo: UserRepository, jwt_service: JwtService) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    /// Register a new user.
    ///
    /// Creates the record (duplicate email fails, including the
    /// concurrent case), mints the token pair for the new numeric id,
    /// and persists the refresh token on the user row.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let user = self.user_repo.create(name, email, password).await?;

        let (access_token, _) = self
            .jwt_service
            .generate_access_token(user.id)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let (refresh_token, _) = self
            .jwt_service
            .generate_refresh_token(user.id)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        self.user_repo
            .set_refresh_token(user.id, Some(&refresh_token))
            .await?;

        Ok(AuthSession {
            access_token,
            refresh_token,
            name: user.name,
        })
    }

    /// Login an existing user.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller. A successful login rotates the stored refresh token,
    /// silently invalidating any session on another device.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let user = self
            .user_repo
            .authenticate(email, password)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        let (access_token, _) = self
            .jwt_service
            .generate_access_token(user.id)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let (refresh_token, _) = self
            .jwt_service
            .generate_refresh_token(user.id)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        self.user_repo
            .set_refresh_token(user.id, Some(&refresh_token))
            .await?;

        Ok(AuthSession {
            access_token,
            refresh_token,
            name: user.name,
        })
    }

    /// Logout: clear the stored refresh token for whichever user holds
    /// this exact value. Succeeds even when no user holds it.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), ApiError> {
        self.user_repo
            .clear_refresh_token_by_value(refresh_token)
            .await?;
        Ok(())
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The token must verify (signature, expiry, refresh type) and must
    /// textually equal the value stored on the user — that equality
    /// check is what makes logged-out or rotated-out tokens invalid
    /// despite still carrying a valid signature. The refresh token is
    /// not rotated on this path.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let claims = self
            .jwt_service
            .validate_refresh_token(refresh_token)
            .map_err(|_| ApiError::RefreshTokenInvalid)?;
        let user_id = claims.user_id().map_err(|_| ApiError::RefreshTokenInvalid)?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::RefreshTokenMismatch)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(ApiError::RefreshTokenMismatch);
        }

        let (access_token, _) = self
            .jwt_service
            .generate_access_token(user.id)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        Ok(access_token)
    }

    /// Validate a bearer access token and return the user id.
    ///
    /// Expired and invalid are distinct outcomes: an expired token gets
    /// 401 so the client can refresh, a forged one gets 403.
    pub fn authenticate(&self, access_token: &str) -> Result<i64, ApiError> {
        let claims = self
            .jwt_service
            .validate_access_token(access_token)
            .map_err(|e| match e {
                JwtError::Expired => ApiError::AccessTokenExpired,
                _ => ApiError::InvalidAccessToken,
            })?;

        claims.user_id().map_err(|_| ApiError::InvalidAccessToken)
    }
}
