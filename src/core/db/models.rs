//! Database models
//!
//! Entity structs mapping to PostgreSQL tables. Wire-facing structs
//! serialize with camelCase field names to match the portal frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered student
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// The single currently-valid refresh token, if any. Overwritten on
    /// login, cleared on logout; exact equality against this value is
    /// what revokes stateless refresh tokens.
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// CheckIn Model
// ============================================================================

/// One attendance event; at most one per user per local calendar day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: i64,
    pub user_id: i64,
    pub check_in_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_hides_secrets() {
        let user = User {
            id: 7,
            name: "Somchai".to_string(),
            email: "somchai@example.com".to_string(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".to_string(),
            refresh_token: Some("eyJhbGciOiJIUzI1NiJ9.x.y".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("somchai@example.com"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$10$"));
        assert!(!json.contains("refresh_token"));
        assert!(!json.contains("eyJhbGciOiJIUzI1NiJ9"));
    }

    #[test]
    fn test_check_in_serializes_camel_case() {
        let check_in = CheckIn {
            id: 1,
            user_id: 7,
            check_in_date: Utc::now(),
        };

        let json = serde_json::to_string(&check_in).unwrap();
        assert!(json.contains("\"userId\":7"));
        assert!(json.contains("\"checkInDate\""));
        assert!(!json.contains("user_id"));
    }

    #[test]
    fn test_check_in_deserializes_camel_case() {
        let json = r#"{
            "id": 3,
            "userId": 9,
            "checkInDate": "2026-08-28T09:30:00Z"
        }"#;

        let check_in: CheckIn = serde_json::from_str(json).unwrap();
        assert_eq!(check_in.id, 3);
        assert_eq!(check_in.user_id, 9);
    }
}
