//! Offline codes: a profile snapshot sealed into the code text itself.
//!
//! These codes are never stored or usage-counted. Anyone holding the
//! shared secret can decode them without contacting the server.

use deskcode_core::db::unix_timestamp;
use deskcode_crypto::{format_offline_code, open, parse_offline_code, seal};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::error::{EngineError, Result};
use super::redeem::ProfileSnapshot;
use super::{ConfigCodeEngine, date_stamp};

/// Payload format written by this build.
pub const PAYLOAD_VERSION: &str = "1.0";

/// Plaintext sealed inside an offline code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedConfigPayload {
    pub config: ProfileSnapshot,
    /// Unix seconds at issue time.
    pub timestamp: i64,
    pub version: String,
}

impl ConfigCodeEngine {
    /// Seal the current settings of `profile_id` into an offline code.
    #[instrument(skip(self))]
    pub async fn issue_offline_code(&self, profile_id: i64) -> Result<String> {
        let profile = self.db.get_profile(profile_id).await?;
        if !profile.is_available() {
            return Err(EngineError::ProfileUnavailable);
        }

        let now = unix_timestamp();
        let payload = EncryptedConfigPayload {
            config: ProfileSnapshot::from(&profile),
            timestamp: now,
            version: PAYLOAD_VERSION.to_string(),
        };
        let plaintext = serde_json::to_vec(&payload)
            .map_err(|e| EngineError::Crypto(format!("payload encoding: {e}")))?;
        let envelope = seal(&plaintext, &self.secret)?;

        info!(profile_id, "Offline config code issued");
        Ok(format_offline_code(
            &self.limits.prefix,
            profile_id,
            &date_stamp(now),
            &envelope,
        ))
    }

    /// Decode an offline code with this engine's secret and limits.
    pub fn decode_offline(&self, code: &str) -> Result<EncryptedConfigPayload> {
        decode_offline_code(
            code,
            &self.secret,
            &self.limits.prefix,
            self.limits.offline_max_age_secs,
            unix_timestamp(),
        )
    }
}

/// Open an offline code issued under `tag` and `secret`.
///
/// Payloads older than `max_age_secs` at `now` fail with `Expired`.
pub fn decode_offline_code(
    code: &str,
    secret: &str,
    tag: &str,
    max_age_secs: i64,
    now: i64,
) -> Result<EncryptedConfigPayload> {
    let parsed = parse_offline_code(code.trim(), tag)?;
    let plaintext = open(&parsed.envelope, secret)?;
    let payload: EncryptedConfigPayload =
        serde_json::from_slice(&plaintext).map_err(|_| EngineError::InvalidCode)?;

    if payload.version != PAYLOAD_VERSION {
        return Err(EngineError::InvalidCode);
    }
    if now.saturating_sub(payload.timestamp) > max_age_secs {
        return Err(EngineError::Expired);
    }

    Ok(payload)
}
