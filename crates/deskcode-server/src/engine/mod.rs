//! Config-code engine.
//!
//! Owns code generation, redemption with expiry and usage-limit
//! enforcement, usage accounting, the default-profile invariant and the
//! offline envelope path. All durable state lives in [`AdminDatabase`];
//! the engine itself is a cheap, cloneable handle.

mod codes;
mod error;
mod generator;
mod payload;
mod profiles;
mod redeem;


use std::sync::Arc;

use deskcode_core::config::CodeConfig;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::storage::{AdminDatabase, Page};

pub use error::{EngineError, Result};
pub use generator::{GenerateRequest, MAX_GENERATION_ATTEMPTS};
pub use payload::{EncryptedConfigPayload, PAYLOAD_VERSION, decode_offline_code};
pub use profiles::ProfileForm;
pub use redeem::ProfileSnapshot;

/// Issuance and paging limits taken from the `codes` config section.
#[derive(Debug, Clone)]
pub struct EngineLimits {
    pub prefix: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub max_batch: u32,
    pub offline_max_age_secs: i64,
}

impl From<&CodeConfig> for EngineLimits {
    fn from(config: &CodeConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
            max_batch: config.max_batch,
            offline_max_age_secs: config.offline_max_age_secs,
        }
    }
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self::from(&CodeConfig::default())
    }
}

/// Requested page; absent or zero values fall back to the defaults.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Paged<T> {
    /// Convert the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Handle to the config-code engine.
#[derive(Clone)]
pub struct ConfigCodeEngine {
    db: AdminDatabase,
    secret: Arc<Zeroizing<String>>,
    limits: Arc<EngineLimits>,
}

impl ConfigCodeEngine {
    /// Create an engine over `db` using `secret` for every envelope operation.
    pub fn new(db: AdminDatabase, secret: impl Into<String>, limits: EngineLimits) -> Self {
        Self {
            db,
            secret: Arc::new(Zeroizing::new(secret.into())),
            limits: Arc::new(limits),
        }
    }

    pub const fn db(&self) -> &AdminDatabase {
        &self.db
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    fn page(&self, request: PageRequest) -> Page {
        let size = match request.page_size {
            None | Some(0) => self.limits.default_page_size,
            Some(n) => n.min(self.limits.max_page_size),
        };
        Page {
            number: request.page.filter(|p| *p > 0).unwrap_or(1),
            size,
        }
    }
}

/// `YYYYMMDD` of the UTC day containing `ts`.
pub(crate) fn date_stamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .unwrap_or_default()
        .format("%Y%m%d")
        .to_string()
}
