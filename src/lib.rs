//! Studyportal - Student Portal Backend
//!
//! Authentication (register/login/logout/refresh) and daily check-in
//! services for the student portal, plus a typed HTTP client that holds
//! the access/refresh token pair for callers.

pub mod client;
pub mod core;
