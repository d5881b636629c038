//! Portal API client
//!
//! Holds the current access/refresh token pair for a logged-in user and
//! talks to the session API. Protected calls attach the bearer token
//! and, on a 401, perform exactly one refresh-and-retry cycle; a second
//! 401 (or a failed refresh) is terminal and the caller must
//! re-authenticate.

use serde::de::DeserializeOwned;

use crate::core::auth::api::{AccessTokenResponse, AuthTokensResponse, MessageResponse};
use crate::core::checkin::api::{CheckInResponse, HistoryResponse};
use crate::core::db::models::CheckIn;
use crate::core::error::ErrorBody;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session expired, please login again")]
    SessionExpired,

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The token pair and display name held after register/login
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub name: String,
}

/// Typed client for the portal backend
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<SessionTokens>,
}

impl PortalClient {
    /// Create a client for the given base URL (e.g. `http://localhost:3000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Current session tokens, if logged in
    pub fn session(&self) -> Option<&SessionTokens> {
        self.session.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Deserialize a success body or surface the server's error message
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| status.to_string());
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Register a new account and store the returned token pair
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&SessionTokens, ClientError> {
        let response = self
            .http
            .post(self.url("/register"))
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        let body: AuthTokensResponse = Self::parse(response).await?;
        Ok(self.session.insert(SessionTokens {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            name: body.name,
        }))
    }

    /// Login and store the returned token pair
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<&SessionTokens, ClientError> {
        let response = self
            .http
            .post(self.url("/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        let body: AuthTokensResponse = Self::parse(response).await?;
        Ok(self.session.insert(SessionTokens {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            name: body.name,
        }))
    }

    /// Logout: invalidate the refresh token server-side and drop the
    /// local session
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let tokens = self.session.take().ok_or(ClientError::NotLoggedIn)?;

        let response = self
            .http
            .post(self.url("/logout"))
            .json(&serde_json::json!({ "refreshToken": tokens.refresh_token }))
            .send()
            .await?;

        Self::parse::<MessageResponse>(response).await?;
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Any failure here is terminal for the session: the stored pair is
    /// dropped and the caller must login again.
    pub async fn refresh(&mut self) -> Result<String, ClientError> {
        let refresh_token = self
            .session
            .as_ref()
            .ok_or(ClientError::NotLoggedIn)?
            .refresh_token
            .clone();

        let response = self
            .http
            .post(self.url("/refresh"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        match Self::parse::<AccessTokenResponse>(response).await {
            Ok(body) => {
                if let Some(session) = self.session.as_mut() {
                    session.access_token = body.access_token.clone();
                }
                Ok(body.access_token)
            }
            Err(ClientError::Http(e)) => Err(ClientError::Http(e)),
            Err(_) => {
                self.session = None;
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Record today's check-in.
    ///
    /// On a 401 the access token is refreshed once and the call retried
    /// once; a second 401 forces re-authentication.
    pub async fn check_in(&mut self) -> Result<CheckIn, ClientError> {
        let access_token = self
            .session
            .as_ref()
            .ok_or(ClientError::NotLoggedIn)?
            .access_token
            .clone();

        let response = self.post_check_in(&access_token).await?;
        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Self::parse::<CheckInResponse>(response)
                .await
                .map(|body| body.check_in);
        }

        // Exactly one refresh-and-retry cycle
        let access_token = self.refresh().await?;
        let retry = self.post_check_in(&access_token).await?;
        if retry.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.session = None;
            return Err(ClientError::SessionExpired);
        }

        Self::parse::<CheckInResponse>(retry)
            .await
            .map(|body| body.check_in)
    }

    async fn post_check_in(&self, access_token: &str) -> Result<reqwest::Response, ClientError> {
        Ok(self
            .http
            .post(self.url("/checkin"))
            .bearer_auth(access_token)
            .send()
            .await?)
    }

    /// Paginated check-in history for a user, newest first
    pub async fn check_in_history(
        &self,
        user_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<HistoryResponse, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/checkInHistory/{}", user_id)))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        Self::parse(response).await
    }
}
