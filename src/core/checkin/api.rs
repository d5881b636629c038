//! Check-in API endpoints
//!
//! - POST /checkin - Record today's check-in (bearer access token)
//! - GET /checkInHistory/{userId} - Paginated attendance history
//!
//! The history endpoint takes the user id from the path and is not
//! gated behind token verification; see DESIGN.md for why this observed
//! contract is kept.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::{AuthService, extract_bearer_token};
use crate::core::db::models::CheckIn;
use crate::core::db::repositories::CheckInRepository;
use crate::core::db::repositories::checkin::total_pages;
use crate::core::error::ApiError;

/// Default history page when the query omits it
const DEFAULT_PAGE: u32 = 1;

/// Default history page size when the query omits it
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Check-in API state
#[derive(Clone)]
pub struct CheckInApiState {
    pub auth_service: AuthService,
    pub check_in_repo: CheckInRepository,
}

/// Response for a successful check-in
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub message: String,
    pub check_in: CheckIn,
}

/// Pagination query parameters for the history endpoint. Kept as raw
/// strings so a malformed value falls back to the default instead of
/// being rejected by the extractor with a non-JSON body.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Parse a pagination parameter, falling back to the default when the
/// value is absent or not a number
fn page_param(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Response for the history endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub history: Vec<CheckIn>,
    pub total_pages: i64,
    pub current_page: u32,
}

/// Create the check-in API router
pub fn checkin_api_router(state: CheckInApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/checkin", post(check_in_handler))
        .route("/checkInHistory/{user_id}", get(history_handler))
        .with_state(state)
}

/// POST /checkin
async fn check_in_handler(
    State(state): State<Arc<CheckInApiState>>,
    headers: HeaderMap,
) -> Result<Json<CheckInResponse>, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let user_id = state.auth_service.authenticate(&token)?;

    let check_in = state
        .check_in_repo
        .record_check_in(user_id, Local::now())
        .await?;

    tracing::info!("Check-in recorded for user: {}", user_id);

    Ok(Json(CheckInResponse {
        message: "Check-in successful!".to_string(),
        check_in,
    }))
}

/// GET /checkInHistory/{userId}?page=&limit=
async fn history_handler(
    State(state): State<Arc<CheckInApiState>>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    // Rejected before any store access
    let user_id: i64 = user_id.parse().map_err(|_| ApiError::InvalidUserId)?;

    let page = page_param(query.page.as_deref(), DEFAULT_PAGE);
    let limit = page_param(query.limit.as_deref(), DEFAULT_PAGE_SIZE);

    let (history, total_count) = state
        .check_in_repo
        .list_check_ins(user_id, page, limit)
        .await?;

    Ok(Json(HistoryResponse {
        history,
        total_pages: total_pages(total_count, limit),
        current_page: page,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::jwt::{JwtConfig, JwtService};
    use crate::core::db::repositories::UserRepository;
    use crate::core::error::ErrorBody;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test_secret_key_for_testing_only_32bytes!";

    fn test_router() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/studyportal_test")
            .expect("lazy pool");
        let auth_service = AuthService::new(
            UserRepository::new(pool.clone()),
            JwtService::new(JwtConfig::new(TEST_SECRET)),
        );
        checkin_api_router(CheckInApiState {
            auth_service,
            check_in_repo: CheckInRepository::new(pool),
        })
    }

    fn check_in_request(auth_header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/checkin");
        if let Some(value) = auth_header {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn error_message(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        body.error
    }

    #[tokio::test]
    async fn test_check_in_without_token_is_401() {
        let response = test_router()
            .oneshot(check_in_request(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(response).await, "Access token missing");
    }

    #[tokio::test]
    async fn test_check_in_with_expired_token_is_401() {
        let jwt = JwtService::new(JwtConfig::new(TEST_SECRET).access_token_expiration(-1));
        let (token, _) = jwt.generate_access_token(42).unwrap();

        let response = test_router()
            .oneshot(check_in_request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(response).await, "Access token expired");
    }

    #[tokio::test]
    async fn test_check_in_with_forged_token_is_403() {
        let jwt = JwtService::new(JwtConfig::new("a_completely_different_secret_here!"));
        let (token, _) = jwt.generate_access_token(42).unwrap();

        let response = test_router()
            .oneshot(check_in_request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_message(response).await, "Invalid token");
    }

    #[tokio::test]
    async fn test_check_in_with_refresh_token_is_403() {
        let jwt = JwtService::new(JwtConfig::new(TEST_SECRET));
        let (token, _) = jwt.generate_refresh_token(42).unwrap();

        let response = test_router()
            .oneshot(check_in_request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_history_non_numeric_user_id_is_400() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/checkInHistory/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "Invalid userId");
    }

    #[tokio::test]
    async fn test_history_garbage_pagination_still_gets_json_error_body() {
        // Malformed page/limit values must not short-circuit in the
        // query extractor; the handler still answers with the JSON
        // error shape
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/checkInHistory/abc?page=abc&limit=xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "Invalid userId");
    }

    #[test]
    fn test_history_response_serialization() {
        let response = HistoryResponse {
            history: vec![],
            total_pages: 3,
            current_page: 2,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"totalPages\":3"));
        assert!(json.contains("\"currentPage\":2"));
        assert!(json.contains("\"history\":[]"));
    }

    #[test]
    fn test_check_in_response_serialization() {
        let response = CheckInResponse {
            message: "Check-in successful!".to_string(),
            check_in: CheckIn {
                id: 1,
                user_id: 42,
                check_in_date: chrono::Utc::now(),
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"checkIn\""));
        assert!(json.contains("\"userId\":42"));
    }

    #[test]
    fn test_page_param_parses_numbers() {
        assert_eq!(page_param(Some("3"), DEFAULT_PAGE), 3);
        assert_eq!(page_param(Some("25"), DEFAULT_PAGE_SIZE), 25);
    }

    #[test]
    fn test_page_param_falls_back_on_missing_or_garbage() {
        assert_eq!(page_param(None, DEFAULT_PAGE), 1);
        assert_eq!(page_param(Some("abc"), DEFAULT_PAGE), 1);
        assert_eq!(page_param(Some("-1"), DEFAULT_PAGE_SIZE), 10);
        assert_eq!(page_param(Some(""), DEFAULT_PAGE_SIZE), 10);
    }
}
