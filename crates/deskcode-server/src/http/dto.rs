//! JSON request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::PageRequest;
use crate::storage::{
    CodeFilter, CodeState, ConfigCode, ConfigCodeListing, ProfileFilter, ServerProfile,
    UsageRecord,
};

pub(crate) fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

// ── Profiles ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub region: String,
    pub id_server: String,
    pub relay_server: String,
    pub api_server: String,
    pub key: String,
    pub is_enabled: bool,
    pub is_default: bool,
    pub priority: i64,
    pub status: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServerProfile> for ProfileView {
    fn from(p: ServerProfile) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            region: p.region,
            id_server: p.id_server,
            relay_server: p.relay_server,
            api_server: p.api_server,
            key: p.access_key,
            is_enabled: p.is_enabled,
            is_default: p.is_default,
            priority: p.priority,
            status: p.status,
            created_at: to_datetime(p.created_at),
            updated_at: to_datetime(p.updated_at),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub name: Option<String>,
    pub region: Option<String>,
    pub is_enabled: Option<bool>,
    pub is_default: Option<bool>,
}

impl ProfileListQuery {
    pub fn split(self) -> (ProfileFilter, PageRequest) {
        (
            ProfileFilter {
                name: self.name.filter(|s| !s.is_empty()),
                region: self.region.filter(|s| !s.is_empty()),
                is_enabled: self.is_enabled,
                is_default: self.is_default,
            },
            PageRequest {
                page: self.page,
                page_size: self.page_size,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SetDefaultBody {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct OfflineCodeView {
    pub profile_id: i64,
    pub code: String,
}

// ── Codes ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub profile_id: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_usage: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchGenerateBody {
    pub profile_id: i64,
    pub count: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_usage: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CodeStatusBody {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct CodeView {
    pub id: i64,
    pub code: String,
    pub profile_id: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub max_usage: Option<i64>,
    pub created_by: i64,
    pub status: i64,
    pub state: CodeState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CodeView {
    pub fn new(c: ConfigCode, now: i64) -> Self {
        let state = c.state(now);
        Self {
            id: c.id,
            code: c.code,
            profile_id: c.profile_id,
            expires_at: c.expires_at.map(to_datetime),
            usage_count: c.usage_count,
            max_usage: c.max_usage,
            created_by: c.created_by,
            status: c.status,
            state,
            created_at: to_datetime(c.created_at),
            updated_at: to_datetime(c.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchView {
    pub count: usize,
    pub codes: Vec<CodeView>,
}

#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub id: i64,
    pub name: String,
    pub region: String,
}

#[derive(Debug, Serialize)]
pub struct CreatorSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct CodeListingView {
    #[serde(flatten)]
    pub code: CodeView,
    pub profile: Option<ProfileSummary>,
    pub creator: Option<CreatorSummary>,
}

impl CodeListingView {
    pub fn new(row: ConfigCodeListing, now: i64) -> Self {
        let profile = row.profile_name.map(|name| ProfileSummary {
            id: row.profile_id,
            name,
            region: row.profile_region.unwrap_or_default(),
        });
        let creator = row.creator_username.map(|username| CreatorSummary {
            id: row.created_by,
            username,
        });
        let code = ConfigCode {
            id: row.id,
            code: row.code,
            profile_id: row.profile_id,
            expires_at: row.expires_at,
            usage_count: row.usage_count,
            max_usage: row.max_usage,
            created_by: row.created_by,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Self {
            code: CodeView::new(code, now),
            profile,
            creator,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CodeListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub profile_id: Option<i64>,
    pub code: Option<String>,
    pub created_by: Option<i64>,
}

impl CodeListQuery {
    pub fn split(self) -> (CodeFilter, PageRequest) {
        (
            CodeFilter {
                profile_id: self.profile_id,
                code: self.code.filter(|s| !s.is_empty()),
                created_by: self.created_by,
            },
            PageRequest {
                page: self.page,
                page_size: self.page_size,
            },
        )
    }
}

#[derive(Debug, Serialize)]
pub struct UsageView {
    pub id: i64,
    pub code_id: i64,
    pub client_address: String,
    pub client_identifier: String,
    pub used_at: DateTime<Utc>,
}

impl From<UsageRecord> for UsageView {
    fn from(u: UsageRecord) -> Self {
        Self {
            id: u.id,
            code_id: u.code_id,
            client_address: u.client_address,
            client_identifier: u.client_identifier,
            used_at: to_datetime(u.used_at),
        }
    }
}

// ── Auth & system ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub server_time: DateTime<Utc>,
    pub uptime: String,
    pub version: &'static str,
    pub database_type: &'static str,
}
