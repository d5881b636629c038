//! Core business logic: configuration, authentication, check-ins, and
//! database access.

pub mod auth;
pub mod checkin;
pub mod config;
pub mod db;
pub mod error;
