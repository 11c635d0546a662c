//! Config-code administration and statistics.

use deskcode_core::db::unix_timestamp;
use tracing::{info, instrument};

use super::error::{EngineError, Result};
use super::{ConfigCodeEngine, PageRequest, Paged};
use crate::storage::{
    CodeFilter, CodeStats, ConfigCode, ConfigCodeListing, STATUS_DISABLED, STATUS_ENABLED,
    UsageRecord,
};

impl ConfigCodeEngine {
    pub async fn list_codes(
        &self,
        filter: &CodeFilter,
        request: PageRequest,
    ) -> Result<Paged<ConfigCodeListing>> {
        let page = self.page(request);
        let items = self.db.list_codes(filter, page).await?;
        let total = self.db.count_codes(filter).await?;
        Ok(Paged {
            items,
            total,
            page: page.number,
            page_size: page.size,
        })
    }

    /// Delete a code and its usage history.
    #[instrument(skip(self))]
    pub async fn delete_code(&self, id: i64) -> Result<()> {
        if !self.db.delete_code(id).await? {
            return Err(EngineError::NotFound(format!("Config code {id}")));
        }
        info!("Config code deleted");
        Ok(())
    }

    /// Enable or administratively disable a code.
    #[instrument(skip(self))]
    pub async fn set_code_status(&self, id: i64, enabled: bool) -> Result<ConfigCode> {
        let status = if enabled { STATUS_ENABLED } else { STATUS_DISABLED };
        if !self.db.set_code_status(id, status).await? {
            return Err(EngineError::NotFound(format!("Config code {id}")));
        }
        info!("Config code status changed");
        Ok(self.db.get_code(id).await?)
    }

    /// Usage history of one code.
    pub async fn list_usage(
        &self,
        code_id: i64,
        request: PageRequest,
    ) -> Result<Paged<UsageRecord>> {
        self.db.get_code(code_id).await?;
        let page = self.page(request);
        let items = self.db.list_usage(code_id, page).await?;
        let total = self.db.count_usage(code_id).await?;
        Ok(Paged {
            items,
            total,
            page: page.number,
            page_size: page.size,
        })
    }

    pub async fn stats(&self) -> Result<CodeStats> {
        Ok(self.db.code_stats(unix_timestamp()).await?)
    }
}
