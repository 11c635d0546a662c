//! JWT claims structure for `DeskCode` admin auth.

use serde::{Deserialize, Serialize};

/// JWT claims embedded in admin access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (admin user ID, decimal).
    pub sub: String,
    pub username: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Authenticated admin, attached to the request by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: i64,
    pub username: String,
}

impl Claims {
    /// The admin identity named by this token, if the subject is well formed.
    pub fn identity(&self) -> Option<AdminIdentity> {
        let id = self.sub.parse().ok()?;
        Some(AdminIdentity {
            id,
            username: self.username.clone(),
        })
    }
}
