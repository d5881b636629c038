//! API error taxonomy
//!
//! Every handler failure is mapped to exactly one variant carrying a
//! fixed user-facing message; the HTTP status code is part of the
//! contract. Internal detail (database errors, signing failures) is
//! logged server-side and never returned to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Handler-facing error type. Display output is the wire message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body is missing or has empty required fields (400)
    #[error("{0}")]
    MissingFields(&'static str),

    /// Non-numeric user id in the path (400)
    #[error("Invalid userId")]
    InvalidUserId,

    /// Registration with an email that is already taken (400)
    #[error("Email is already in use")]
    EmailInUse,

    /// Second check-in on the same calendar day (400)
    #[error("You have already checked in today")]
    AlreadyCheckedIn,

    /// Unknown email or wrong password; deliberately one message (401)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Protected call without a bearer token (401)
    #[error("Access token missing")]
    AccessTokenMissing,

    /// Access token past its expiry; the client may refresh (401)
    #[error("Access token expired")]
    AccessTokenExpired,

    /// Forged or structurally broken access token (403)
    #[error("Invalid token")]
    InvalidAccessToken,

    /// Refresh call without a token in the body (401)
    #[error("Refresh token is missing")]
    RefreshTokenMissing,

    /// Refresh token failed signature or expiry verification (403)
    #[error("Invalid or expired refresh token")]
    RefreshTokenInvalid,

    /// Verified refresh token does not match the stored value, i.e.
    /// it was rotated out or the user logged out (403)
    #[error("Invalid refresh token")]
    RefreshTokenMismatch,

    /// Anything unexpected from a collaborator (500); the detail is
    /// logged, never sent
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFields(_)
            | ApiError::InvalidUserId
            | ApiError::EmailInUse
            | ApiError::AlreadyCheckedIn => StatusCode::BAD_REQUEST,

            ApiError::InvalidCredentials
            | ApiError::AccessTokenMissing
            | ApiError::AccessTokenExpired
            | ApiError::RefreshTokenMissing => StatusCode::UNAUTHORIZED,

            ApiError::InvalidAccessToken
            | ApiError::RefreshTokenInvalid
            | ApiError::RefreshTokenMismatch => StatusCode::FORBIDDEN,

            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::core::db::UserRepositoryError> for ApiError {
    fn from(err: crate::core::db::UserRepositoryError) -> Self {
        use crate::core::db::UserRepositoryError;

        match err {
            UserRepositoryError::EmailAlreadyExists => ApiError::EmailInUse,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<crate::core::db::CheckInRepositoryError> for ApiError {
    fn from(err: crate::core::db::CheckInRepositoryError) -> Self {
        use crate::core::db::CheckInRepositoryError;

        match err {
            CheckInRepositoryError::AlreadyCheckedIn => ApiError::AlreadyCheckedIn,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Wire shape of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref detail) = self {
            tracing::error!("internal error: {}", detail);
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}
