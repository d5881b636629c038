//! Auth API endpoints
//!
//! REST endpoints for the session protocol:
//! - POST /register - Create an account and get tokens
//! - POST /login - Login and get tokens (rotates the refresh token)
//! - POST /logout - Invalidate the submitted refresh token
//! - POST /refresh - Exchange the refresh token for a new access token

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::AuthService;
use crate::core::error::ApiError;

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

/// Registration request body; presence is validated by the handler so
/// missing fields map to 400 rather than a deserialization rejection
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Logout / refresh request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    pub refresh_token: Option<String>,
}

/// Response for register and login
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub name: String,
}

/// Response for refresh: a new access token only
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/refresh", post(refresh_handler))
        .with_state(state)
}

/// Present and non-empty, the way the portal frontend sends fields
fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// POST /register
async fn register_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, email, password) = match (
        required(&body.name),
        required(&body.email),
        required(&body.password),
    ) {
        (Some(n), Some(e), Some(p)) => (n, e, p),
        _ => {
            return Err(ApiError::MissingFields(
                "Name, email, and password are required",
            ));
        }
    };

    tracing::info!("Registration attempt for email: {}", email);

    let session = state.auth_service.register(name, email, password).await?;

    tracing::info!("User registered successfully: {}", email);

    Ok((
        StatusCode::CREATED,
        Json(AuthTokensResponse {
            message: "User registered successfully".to_string(),
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            name: session.name,
        }),
    ))
}

/// POST /login
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let (email, password) = match (required(&body.email), required(&body.password)) {
        (Some(e), Some(p)) => (e, p),
        _ => return Err(ApiError::MissingFields("Email and password are required")),
    };

    tracing::info!("Login attempt for email: {}", email);

    let session = state.auth_service.login(email, password).await?;

    tracing::info!("User logged in successfully: {}", email);

    Ok(Json(AuthTokensResponse {
        message: "Login successful".to_string(),
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        name: session.name,
    }))
}

/// POST /logout
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    let refresh_token = required(&body.refresh_token)
        .ok_or(ApiError::MissingFields("Refresh token is required"))?;

    tracing::info!("Logout request");

    state.auth_service.logout(refresh_token).await?;

    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}

/// POST /refresh
async fn refresh_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let refresh_token =
        required(&body.refresh_token).ok_or(ApiError::RefreshTokenMissing)?;

    tracing::debug!("Token refresh request");

    let access_token = state.auth_service.refresh(refresh_token).await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// Extract Bearer token from Authorization header.
///
/// A missing or malformed header is an authentication failure (401),
/// not an authorization one: there is no token to judge.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::AccessTokenMissing)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::AccessTokenMissing)?;

    if token.is_empty() {
        return Err(ApiError::AccessTokenMissing);
    }

    Ok(token.to_string())
}
