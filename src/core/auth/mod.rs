//! Authentication module
//!
//! - JWT token generation and validation (two classes: access, refresh)
//! - User registration and login
//! - Refresh-token rotation and revocation via the stored per-user value
//! - REST API endpoints for the session protocol

pub mod api;
pub mod jwt;
pub mod service;

pub use api::{AuthApiState, auth_api_router, extract_bearer_token};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenType};
pub use service::{AuthService, AuthSession};
