//! Code issuance with bounded collision retry.

use deskcode_core::db::unix_timestamp;
use deskcode_crypto::generate_code;
use tracing::{debug, info, instrument};

use super::error::{EngineError, Result};
use super::{ConfigCodeEngine, date_stamp};
use crate::storage::{ConfigCode, DatabaseError, NewCodeParams};

/// Insert attempts before giving up with `GenerationExhausted`.
pub const MAX_GENERATION_ATTEMPTS: u32 = 10;

/// Parameters shared by single and batch generation.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest {
    pub profile_id: i64,
    /// Absolute Unix expiry; `None` never expires.
    pub expires_at: Option<i64>,
    /// `None` is unlimited.
    pub max_usage: Option<i64>,
    /// Admin user issuing the code.
    pub created_by: i64,
}

impl ConfigCodeEngine {
    /// Issue one code for a profile.
    #[instrument(skip(self), fields(profile_id = request.profile_id))]
    pub async fn generate(&self, request: &GenerateRequest) -> Result<ConfigCode> {
        let now = unix_timestamp();
        self.check_generate_request(request, now).await?;

        let code = self.insert_unique(request, now).await?;
        info!(code_id = code.id, "Config code generated");
        Ok(code)
    }

    /// Issue `count` codes sharing the same limits.
    ///
    /// Codes are inserted one by one; a failure part way leaves the codes
    /// already issued in place.
    #[instrument(skip(self), fields(profile_id = request.profile_id))]
    pub async fn batch_generate(
        &self,
        request: &GenerateRequest,
        count: u32,
    ) -> Result<Vec<ConfigCode>> {
        if count == 0 || count > self.limits.max_batch {
            return Err(EngineError::InvalidArgument(format!(
                "count must be between 1 and {}",
                self.limits.max_batch
            )));
        }
        let now = unix_timestamp();
        self.check_generate_request(request, now).await?;

        let mut codes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            codes.push(self.insert_unique(request, now).await?);
        }

        info!(count, "Config codes generated");
        Ok(codes)
    }

    async fn check_generate_request(&self, request: &GenerateRequest, now: i64) -> Result<()> {
        if let Some(max) = request.max_usage {
            if max < 1 {
                return Err(EngineError::InvalidArgument(
                    "max_usage must be at least 1".to_string(),
                ));
            }
        }
        if let Some(at) = request.expires_at {
            if at <= now {
                return Err(EngineError::InvalidArgument(
                    "expires_at must be in the future".to_string(),
                ));
            }
        }
        self.db.get_profile(request.profile_id).await?;
        Ok(())
    }

    async fn insert_unique(&self, request: &GenerateRequest, now: i64) -> Result<ConfigCode> {
        let stamp = date_stamp(now);
        let prefix = self.limits.prefix.clone();
        self.insert_with(request, || generate_code(&prefix, &stamp).map_err(EngineError::from))
            .await
    }

    /// Insert codes drawn from `next_code` until one is accepted by the
    /// store's unique index.
    pub(super) async fn insert_with(
        &self,
        request: &GenerateRequest,
        mut next_code: impl FnMut() -> Result<String>,
    ) -> Result<ConfigCode> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = next_code()?;
            let params = NewCodeParams {
                code: &code,
                profile_id: request.profile_id,
                expires_at: request.expires_at,
                max_usage: request.max_usage,
                created_by: request.created_by,
            };
            match self.db.insert_code(&params).await {
                Ok(stored) => return Ok(stored),
                Err(DatabaseError::Conflict(_)) => {
                    debug!(attempt, "Config code collided, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(EngineError::GenerationExhausted(MAX_GENERATION_ATTEMPTS))
    }
}
