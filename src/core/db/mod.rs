//! Database module
//!
//! Connectivity, models, and repositories for persistent storage using
//! PostgreSQL and SQLx.

pub mod models;
pub mod pool;
pub mod repositories;

pub use models::{CheckIn, User};
pub use pool::{DbConfig, DbError, connect_with_retry, create_pool, health_check, run_migrations};
pub use repositories::{
    CheckInRepository, CheckInRepositoryError, UserRepository, UserRepositoryError,
};

pub use sqlx::PgPool;
