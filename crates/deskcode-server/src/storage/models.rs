//! Data models for `DeskCode` admin storage.

use serde::{Deserialize, Serialize};

/// `status` value for an enabled profile or code.
pub const STATUS_ENABLED: i64 = 1;

/// `status` value for an administratively disabled profile or code.
pub const STATUS_DISABLED: i64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServerProfile {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub region: String,
    pub id_server: String,
    pub relay_server: String,
    pub api_server: String,
    pub access_key: String,
    pub is_enabled: bool,
    pub is_default: bool,
    pub priority: i64,
    pub status: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ServerProfile {
    /// A profile can back a redemption only when both flags allow it.
    pub const fn is_available(&self) -> bool {
        self.is_enabled && self.status == STATUS_ENABLED
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConfigCode {
    pub id: i64,
    pub code: String,
    pub profile_id: i64,
    /// `None` never expires.
    pub expires_at: Option<i64>,
    pub usage_count: i64,
    /// `None` is unlimited.
    pub max_usage: Option<i64>,
    pub created_by: i64,
    pub status: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Lifecycle state of a stored code as observed at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeState {
    Active,
    Disabled,
    Expired,
    UsedUp,
}

impl ConfigCode {
    pub const fn is_expired(&self, now: i64) -> bool {
        match self.expires_at {
            Some(at) => now >= at,
            None => false,
        }
    }

    pub const fn is_used_up(&self) -> bool {
        match self.max_usage {
            Some(max) => self.usage_count >= max,
            None => false,
        }
    }

    /// Derived state. Expiry and usage exhaustion win over the stored flag
    /// only when the code is still enabled.
    pub const fn state(&self, now: i64) -> CodeState {
        if self.status != STATUS_ENABLED {
            CodeState::Disabled
        } else if self.is_expired(now) {
            CodeState::Expired
        } else if self.is_used_up() {
            CodeState::UsedUp
        } else {
            CodeState::Active
        }
    }
}

/// A code row joined with a summary of its profile and its creator.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConfigCodeListing {
    pub id: i64,
    pub code: String,
    pub profile_id: i64,
    pub expires_at: Option<i64>,
    pub usage_count: i64,
    pub max_usage: Option<i64>,
    pub created_by: i64,
    pub status: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub profile_name: Option<String>,
    pub profile_region: Option<String>,
    pub creator_username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageRecord {
    pub id: i64,
    pub code_id: i64,
    pub client_address: String,
    pub client_identifier: String,
    pub used_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Aggregate counters over codes and usage records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStats {
    pub total_codes: i64,
    /// Enabled, unexpired and not used up.
    pub active_codes: i64,
    pub expired_codes: i64,
    /// Sum of the per-code redemption counters.
    pub total_usage: i64,
    /// Usage records since the start of the current UTC day.
    pub today_usage: i64,
    /// Current UTC day plus the six before it.
    pub week_usage: i64,
    /// Current UTC day plus the 29 before it.
    pub month_usage: i64,
}

/// One page of a listing, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn offset(self) -> i64 {
        i64::from(self.number.saturating_sub(1)) * i64::from(self.size)
    }

    pub fn limit(self) -> i64 {
        i64::from(self.size)
    }
}
