//! Database queries for the `server_profiles` table.

use deskcode_core::db::unix_timestamp;
use sqlx::{QueryBuilder, Sqlite};

use super::db::{AdminDatabase, DatabaseError};
use super::models::{Page, STATUS_ENABLED, ServerProfile};

const INSERT_PROFILE_SQL: &str = "INSERT INTO server_profiles (name, description, region, \
    id_server, relay_server, api_server, access_key, is_enabled, is_default, priority, \
    status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_PROFILE_SQL: &str = "UPDATE server_profiles SET name = ?, description = ?, \
    region = ?, id_server = ?, relay_server = ?, api_server = ?, access_key = ?, \
    is_enabled = ?, is_default = ?, priority = ?, updated_at = ? WHERE id = ?";

const CLEAR_DEFAULT_SQL: &str =
    "UPDATE server_profiles SET is_default = 0, updated_at = ? WHERE is_default = 1";

/// Profile fields written on create and on a full update.
pub struct ProfileParams<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub region: &'a str,
    pub id_server: &'a str,
    pub relay_server: &'a str,
    pub api_server: &'a str,
    pub access_key: &'a str,
    pub is_enabled: bool,
    pub is_default: bool,
    pub priority: i64,
}

impl ProfileParams<'_> {
    fn bind_to<'q>(
        &'q self,
        query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        query
            .bind(self.name)
            .bind(self.description)
            .bind(self.region)
            .bind(self.id_server)
            .bind(self.relay_server)
            .bind(self.api_server)
            .bind(self.access_key)
            .bind(self.is_enabled)
            .bind(self.is_default)
            .bind(self.priority)
    }
}

/// Update form. `None` flags keep the stored value.
pub struct ProfileUpdate<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub region: &'a str,
    pub id_server: &'a str,
    pub relay_server: &'a str,
    pub api_server: &'a str,
    pub access_key: &'a str,
    pub priority: i64,
    pub is_enabled: Option<bool>,
    pub is_default: Option<bool>,
}

/// Listing filters; `None` matches everything.
#[derive(Debug, Default, Clone)]
pub struct ProfileFilter {
    /// Substring of the profile name.
    pub name: Option<String>,
    pub region: Option<String>,
    pub is_enabled: Option<bool>,
    pub is_default: Option<bool>,
}

impl ProfileFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(name) = &self.name {
            qb.push(" AND instr(name, ").push_bind(name.clone()).push(") > 0");
        }
        if let Some(region) = &self.region {
            qb.push(" AND region = ").push_bind(region.clone());
        }
        if let Some(enabled) = self.is_enabled {
            qb.push(" AND is_enabled = ").push_bind(enabled);
        }
        if let Some(default) = self.is_default {
            qb.push(" AND is_default = ").push_bind(default);
        }
    }
}

/// Result of a guarded profile delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileDeleteOutcome {
    Deleted,
    NotFound,
    /// Still referenced by this many codes; nothing was deleted.
    InUse(i64),
}

impl AdminDatabase {
    // =========================================================================
    // Profile queries
    // =========================================================================

    /// Insert a profile. A default profile first clears every other default
    /// inside the same transaction.
    pub async fn create_profile(
        &self,
        params: &ProfileParams<'_>,
    ) -> Result<ServerProfile, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        if params.is_default {
            sqlx::query(CLEAR_DEFAULT_SQL)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        let result = params
            .bind_to(sqlx::query(INSERT_PROFILE_SQL))
            .bind(STATUS_ENABLED)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        let id = result.last_insert_rowid();

        let created = sqlx::query_as::<_, ServerProfile>("SELECT * FROM server_profiles WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// Get a profile by ID.
    pub async fn get_profile(&self, id: i64) -> Result<ServerProfile, DatabaseError> {
        sqlx::query_as::<_, ServerProfile>("SELECT * FROM server_profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Profile {id}")))
    }

    /// Apply an update form, merging absent flags with the stored row.
    pub async fn update_profile(
        &self,
        id: i64,
        update: &ProfileUpdate<'_>,
    ) -> Result<ServerProfile, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let existing = sqlx::query_as::<_, ServerProfile>("SELECT * FROM server_profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Profile {id}")))?;

        let now = unix_timestamp();
        let merged = ProfileParams {
            name: update.name,
            description: update.description,
            region: update.region,
            id_server: update.id_server,
            relay_server: update.relay_server,
            api_server: update.api_server,
            access_key: update.access_key,
            is_enabled: update.is_enabled.unwrap_or(existing.is_enabled),
            is_default: update.is_default.unwrap_or(existing.is_default),
            priority: update.priority,
        };

        if merged.is_default && !existing.is_default {
            sqlx::query(CLEAR_DEFAULT_SQL)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        merged
            .bind_to(sqlx::query(UPDATE_PROFILE_SQL))
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query_as::<_, ServerProfile>("SELECT * FROM server_profiles WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Make `id` the only default profile.
    ///
    /// Clear-all and set-one run in one transaction; an unknown `id` rolls
    /// back and leaves the previous default in place.
    pub async fn set_default_profile(&self, id: i64) -> Result<(), DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        sqlx::query(CLEAR_DEFAULT_SQL)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let result =
            sqlx::query("UPDATE server_profiles SET is_default = 1, updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DatabaseError::NotFound(format!("Profile {id}")));
        }

        tx.commit().await?;

        Ok(())
    }

    /// The default profile, if it is also enabled.
    pub async fn get_default_profile(&self) -> Result<Option<ServerProfile>, DatabaseError> {
        let profile = sqlx::query_as::<_, ServerProfile>(
            "SELECT * FROM server_profiles WHERE is_default = 1 AND is_enabled = 1 AND status = ? LIMIT 1",
        )
        .bind(STATUS_ENABLED)
        .fetch_optional(self.pool())
        .await?;

        Ok(profile)
    }

    /// List profiles, highest priority first, then newest.
    pub async fn list_profiles(
        &self,
        filter: &ProfileFilter,
        page: Page,
    ) -> Result<Vec<ServerProfile>, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM server_profiles");
        filter.push_where(&mut qb);
        qb.push(" ORDER BY priority DESC, created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let profiles = qb
            .build_query_as::<ServerProfile>()
            .fetch_all(self.pool())
            .await?;

        Ok(profiles)
    }

    /// Count profiles matching a filter.
    pub async fn count_profiles(&self, filter: &ProfileFilter) -> Result<i64, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM server_profiles");
        filter.push_where(&mut qb);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }

    /// Delete a profile unless a config code still references it.
    ///
    /// The reference count and the delete share one transaction.
    pub async fn delete_profile_if_unreferenced(
        &self,
        id: i64,
    ) -> Result<ProfileDeleteOutcome, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM config_codes WHERE profile_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if references > 0 {
            tx.rollback().await?;
            return Ok(ProfileDeleteOutcome::InUse(references));
        }

        let result = sqlx::query("DELETE FROM server_profiles WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            Ok(ProfileDeleteOutcome::NotFound)
        } else {
            Ok(ProfileDeleteOutcome::Deleted)
        }
    }
}
