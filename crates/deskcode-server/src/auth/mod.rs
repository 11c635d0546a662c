//! Admin authentication for the `DeskCode` server.
//!
//! Provides JWT access tokens, argon2id password hashing and the axum
//! middleware guarding `/admin/*` routes.

pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::{AdminIdentity, Claims};
pub use jwt::JwtManager;
pub use middleware::require_admin;
