//! Database repositories
//!
//! Repositories encapsulate data access logic and provide a clean API
//! for business logic to interact with the database.

pub mod checkin;
pub mod user;

pub use checkin::{CheckInRepository, CheckInRepositoryError};
pub use user::{UserRepository, UserRepositoryError};
