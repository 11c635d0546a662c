//! Config-code and usage-record queries.

use deskcode_core::db::{SECS_PER_DAY, unix_timestamp, utc_day_start};
use sqlx::{QueryBuilder, Sqlite};

use super::db::{AdminDatabase, DatabaseError};
use super::models::{CodeStats, ConfigCode, ConfigCodeListing, Page, STATUS_ENABLED, UsageRecord};

const LISTING_SELECT_SQL: &str = "SELECT c.id, c.code, c.profile_id, c.expires_at, \
    c.usage_count, c.max_usage, c.created_by, c.status, c.created_at, c.updated_at, \
    p.name AS profile_name, p.region AS profile_region, u.username AS creator_username \
    FROM config_codes c \
    LEFT JOIN server_profiles p ON p.id = c.profile_id \
    LEFT JOIN admin_users u ON u.id = c.created_by";

/// Parameters for inserting a new code.
pub struct NewCodeParams<'a> {
    pub code: &'a str,
    pub profile_id: i64,
    pub expires_at: Option<i64>,
    pub max_usage: Option<i64>,
    pub created_by: i64,
}

/// Listing filters; `None` matches everything.
#[derive(Debug, Default, Clone)]
pub struct CodeFilter {
    pub profile_id: Option<i64>,
    /// Substring of the code string.
    pub code: Option<String>,
    pub created_by: Option<i64>,
}

impl CodeFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(profile_id) = self.profile_id {
            qb.push(" AND c.profile_id = ").push_bind(profile_id);
        }
        if let Some(code) = &self.code {
            qb.push(" AND instr(c.code, ").push_bind(code.clone()).push(") > 0");
        }
        if let Some(created_by) = self.created_by {
            qb.push(" AND c.created_by = ").push_bind(created_by);
        }
    }
}

impl AdminDatabase {
    // =========================================================================
    // Code queries
    // =========================================================================

    /// Insert a code. A duplicate code string fails with `Conflict`.
    pub async fn insert_code(&self, params: &NewCodeParams<'_>) -> Result<ConfigCode, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO config_codes (code, profile_id, expires_at, usage_count, max_usage, created_by, status, created_at, updated_at) \
             VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?)",
        )
        .bind(params.code)
        .bind(params.profile_id)
        .bind(params.expires_at)
        .bind(params.max_usage)
        .bind(params.created_by)
        .bind(STATUS_ENABLED)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_code(result.last_insert_rowid()).await
    }

    /// Get a code by ID.
    pub async fn get_code(&self, id: i64) -> Result<ConfigCode, DatabaseError> {
        sqlx::query_as::<_, ConfigCode>("SELECT * FROM config_codes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Config code {id}")))
    }

    /// Look up a code by its string.
    pub async fn find_code(&self, code: &str) -> Result<Option<ConfigCode>, DatabaseError> {
        let found = sqlx::query_as::<_, ConfigCode>("SELECT * FROM config_codes WHERE code = ?")
            .bind(code)
            .fetch_optional(self.pool())
            .await?;

        Ok(found)
    }

    /// Consume one redemption of code `id` if it is still redeemable at `now`.
    ///
    /// The checks and the increment are one statement, so concurrent
    /// redemptions of the same code can never push `usage_count` past
    /// `max_usage`. Returns `false` when nothing was consumed.
    pub async fn try_consume_code(&self, id: i64, now: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE config_codes SET usage_count = usage_count + 1, updated_at = ? \
             WHERE id = ? AND status = ? \
             AND (max_usage IS NULL OR usage_count < max_usage) \
             AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(now)
        .bind(id)
        .bind(STATUS_ENABLED)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Set the administrative status of a code.
    pub async fn set_code_status(&self, id: i64, status: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE config_codes SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a code together with its usage history (transactionally).
    pub async fn delete_code(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM config_code_usages WHERE code_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM config_codes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// List codes, newest first, with profile summary and creator name.
    pub async fn list_codes(
        &self,
        filter: &CodeFilter,
        page: Page,
    ) -> Result<Vec<ConfigCodeListing>, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new(LISTING_SELECT_SQL);
        filter.push_where(&mut qb);
        qb.push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let codes = qb
            .build_query_as::<ConfigCodeListing>()
            .fetch_all(self.pool())
            .await?;

        Ok(codes)
    }

    /// Count codes matching a filter.
    pub async fn count_codes(&self, filter: &CodeFilter) -> Result<i64, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM config_codes c");
        filter.push_where(&mut qb);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Usage queries
    // =========================================================================

    /// Append one usage record.
    pub async fn append_usage(
        &self,
        code_id: i64,
        client_address: &str,
        client_identifier: &str,
        used_at: i64,
    ) -> Result<i64, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO config_code_usages (code_id, client_address, client_identifier, used_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(code_id)
        .bind(client_address)
        .bind(client_identifier)
        .bind(used_at)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Usage history of one code, most recent first.
    pub async fn list_usage(
        &self,
        code_id: i64,
        page: Page,
    ) -> Result<Vec<UsageRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, UsageRecord>(
            "SELECT * FROM config_code_usages WHERE code_id = ? ORDER BY used_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(code_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;

        Ok(records)
    }

    /// Number of usage records for one code.
    pub async fn count_usage(&self, code_id: i64) -> Result<i64, DatabaseError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM config_code_usages WHERE code_id = ?")
                .bind(code_id)
                .fetch_one(self.pool())
                .await?;

        Ok(count)
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Aggregate counters as of `now`.
    pub async fn code_stats(&self, now: i64) -> Result<CodeStats, DatabaseError> {
        // total_usage sums the counters: usage rows are best-effort and may be missing.
        let (total_codes, active_codes, expired_codes, total_usage): (i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT COUNT(*), \
                 COALESCE(SUM(CASE WHEN status = ? \
                     AND (expires_at IS NULL OR expires_at > ?) \
                     AND (max_usage IS NULL OR usage_count < max_usage) THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN expires_at IS NOT NULL AND expires_at <= ? THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(usage_count), 0) \
                 FROM config_codes",
            )
            .bind(STATUS_ENABLED)
            .bind(now)
            .bind(now)
            .fetch_one(self.pool())
            .await?;

        let today = utc_day_start(now);
        let (today_usage, week_usage, month_usage): (i64, i64, i64) =
            sqlx::query_as(
                "SELECT \
                 COALESCE(SUM(CASE WHEN used_at >= ? THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN used_at >= ? THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN used_at >= ? THEN 1 ELSE 0 END), 0) \
                 FROM config_code_usages",
            )
            .bind(today)
            .bind(today - 6 * SECS_PER_DAY)
            .bind(today - 29 * SECS_PER_DAY)
            .fetch_one(self.pool())
            .await?;

        Ok(CodeStats {
            total_codes,
            active_codes,
            expired_codes,
            total_usage,
            today_usage,
            week_usage,
            month_usage,
        })
    }
}
