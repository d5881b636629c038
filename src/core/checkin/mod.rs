//! Daily check-in module
//!
//! REST endpoints over the check-in ledger: recording today's
//! attendance and reading the paginated history.

pub mod api;

pub use api::{CheckInApiState, checkin_api_router};
