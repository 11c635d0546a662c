//! SQLite storage for the `DeskCode` admin server.
//!
//! Provides persistence for admin users, server profiles, config codes and
//! their usage history.

mod db;
mod models;
mod queries_codes;
mod queries_profiles;
mod queries_users;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;

pub use db::{AdminDatabase, DatabaseError};
pub use models::*;
pub use queries_codes::{CodeFilter, NewCodeParams};
pub use queries_profiles::{ProfileDeleteOutcome, ProfileFilter, ProfileParams, ProfileUpdate};
