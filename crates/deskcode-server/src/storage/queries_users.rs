//! Admin user queries.

use deskcode_core::db::unix_timestamp;

use super::db::{AdminDatabase, DatabaseError};
use super::models::AdminUser;

impl AdminDatabase {
    /// Create an admin user. A taken username fails with `Conflict`.
    pub async fn create_admin_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUser, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO admin_users (username, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_admin_user(result.last_insert_rowid()).await
    }

    /// Get an admin user by ID.
    pub async fn get_admin_user(&self, id: i64) -> Result<AdminUser, DatabaseError> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Admin user {id}")))
    }

    /// Get an admin user by username.
    pub async fn get_admin_user_by_username(
        &self,
        username: &str,
    ) -> Result<AdminUser, DatabaseError> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Admin user {username}")))
    }
}
