//! Redemption, validation and usage accounting.

use deskcode_core::db::unix_timestamp;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::ConfigCodeEngine;
use super::error::{EngineError, Result};
use crate::storage::{CodeState, ConfigCode, DatabaseError, ServerProfile};

/// Longest code text worth a store lookup.
const MAX_CODE_LEN: usize = 256;

/// Client-visible fields of a profile, frozen at redemption time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub name: String,
    pub region: String,
    pub id_server: String,
    pub relay_server: String,
    pub api_server: String,
    pub key: String,
}

impl From<&ServerProfile> for ProfileSnapshot {
    fn from(p: &ServerProfile) -> Self {
        Self {
            name: p.name.clone(),
            region: p.region.clone(),
            id_server: p.id_server.clone(),
            relay_server: p.relay_server.clone(),
            api_server: p.api_server.clone(),
            key: p.access_key.clone(),
        }
    }
}

/// Map a derived code state to the failure a caller sees.
fn state_error(code: &ConfigCode, now: i64) -> Option<EngineError> {
    match code.state(now) {
        CodeState::Active => None,
        CodeState::Disabled => Some(EngineError::NotFound("Config code".to_string())),
        CodeState::Expired => Some(EngineError::Expired),
        CodeState::UsedUp => Some(EngineError::UsageLimitExceeded),
    }
}

impl ConfigCodeEngine {
    /// Redeem one use of `code` and return the profile it grants.
    ///
    /// Expired or used-up codes fail without touching the counter. The
    /// increment itself is a single conditional update, so concurrent
    /// redemptions never overshoot `max_usage`.
    #[instrument(skip_all)]
    pub async fn redeem(&self, code: &str) -> Result<ProfileSnapshot> {
        let (stored, profile) = self.check_code(code).await?;
        let now = unix_timestamp();

        if !self.db.try_consume_code(stored.id, now).await? {
            // Lost a race: re-read and report why the code is no longer usable.
            let current = self.db.get_code(stored.id).await?;
            let err = state_error(&current, now).unwrap_or(EngineError::UsageLimitExceeded);
            debug!(code_id = stored.id, error = %err, "Redemption lost to a concurrent change");
            return Err(err);
        }

        info!(code_id = stored.id, profile_id = profile.id, "Config code redeemed");
        Ok(ProfileSnapshot::from(&profile))
    }

    /// Run every redemption check without consuming a use.
    #[instrument(skip_all)]
    pub async fn check(&self, code: &str) -> Result<ProfileSnapshot> {
        let (_, profile) = self.check_code(code).await?;
        Ok(ProfileSnapshot::from(&profile))
    }

    /// `true` when `code` could be redeemed right now.
    ///
    /// Business-rule failures become `false`; store failures still
    /// propagate.
    pub async fn validate(&self, code: &str) -> Result<bool> {
        match self.check(code).await {
            Ok(_) => Ok(true),
            Err(EngineError::Store(e)) => Err(EngineError::Store(e)),
            Err(_) => Ok(false),
        }
    }

    /// Append one usage record for `code`.
    ///
    /// Accepts the same padded text that [`redeem`](Self::redeem) does.
    pub async fn record_usage(
        &self,
        code: &str,
        client_address: &str,
        client_identifier: &str,
    ) -> Result<()> {
        let stored = self
            .db
            .find_code(code.trim())
            .await?
            .ok_or_else(|| EngineError::NotFound("Config code".to_string()))?;
        self.db
            .append_usage(stored.id, client_address, client_identifier, unix_timestamp())
            .await?;
        Ok(())
    }

    /// Record usage on a detached task. Failures are logged and dropped.
    pub fn spawn_record_usage(
        &self,
        code: String,
        client_address: String,
        client_identifier: String,
    ) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine
                .record_usage(&code, &client_address, &client_identifier)
                .await
            {
                warn!(error = %e, client_address, "Failed to record config code usage");
            }
        })
    }

    async fn check_code(&self, code: &str) -> Result<(ConfigCode, ServerProfile)> {
        let code = code.trim();
        if code.is_empty() || code.len() > MAX_CODE_LEN {
            return Err(EngineError::NotFound("Config code".to_string()));
        }

        let stored = self
            .db
            .find_code(code)
            .await?
            .ok_or_else(|| EngineError::NotFound("Config code".to_string()))?;

        if let Some(err) = state_error(&stored, unix_timestamp()) {
            return Err(err);
        }

        let profile = match self.db.get_profile(stored.profile_id).await {
            Ok(p) if p.is_available() => p,
            Ok(_) | Err(DatabaseError::NotFound(_)) => {
                return Err(EngineError::ProfileUnavailable);
            }
            Err(e) => return Err(e.into()),
        };

        Ok((stored, profile))
    }
}
