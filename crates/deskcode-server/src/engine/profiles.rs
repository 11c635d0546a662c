//! Server profile administration.

use serde::Deserialize;
use tracing::{info, instrument};

use super::error::{EngineError, Result};
use super::{ConfigCodeEngine, PageRequest, Paged};
use crate::storage::{
    ProfileDeleteOutcome, ProfileFilter, ProfileParams, ProfileUpdate, ServerProfile,
};

/// Create/update form for a profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub description: String,
    pub region: String,
    pub id_server: String,
    pub relay_server: String,
    pub api_server: String,
    pub key: String,
    /// On update, `None` keeps the stored value. On create it means enabled.
    pub is_enabled: Option<bool>,
    /// On update, `None` keeps the stored value. On create it means not default.
    pub is_default: Option<bool>,
    pub priority: i64,
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        let msg = if min == 0 {
            format!("{field} must be at most {max} characters")
        } else {
            format!("{field} must be {min} to {max} characters")
        };
        return Err(EngineError::InvalidArgument(msg));
    }
    Ok(())
}

impl ProfileForm {
    pub fn validate(&self) -> Result<()> {
        check_len("name", self.name.trim(), 1, 100)?;
        check_len("description", &self.description, 0, 500)?;
        check_len("region", &self.region, 0, 50)?;
        check_len("id_server", self.id_server.trim(), 1, 255)?;
        check_len("relay_server", &self.relay_server, 0, 255)?;
        check_len("api_server", &self.api_server, 0, 255)?;
        check_len("key", &self.key, 0, 500)?;
        Ok(())
    }
}

impl ConfigCodeEngine {
    #[instrument(skip_all, fields(name = %form.name))]
    pub async fn create_profile(&self, form: &ProfileForm) -> Result<ServerProfile> {
        form.validate()?;
        let params = ProfileParams {
            name: form.name.trim(),
            description: &form.description,
            region: &form.region,
            id_server: form.id_server.trim(),
            relay_server: &form.relay_server,
            api_server: &form.api_server,
            access_key: &form.key,
            is_enabled: form.is_enabled.unwrap_or(true),
            is_default: form.is_default.unwrap_or(false),
            priority: form.priority,
        };
        let profile = self.db.create_profile(&params).await?;
        info!(profile_id = profile.id, "Server profile created");
        Ok(profile)
    }

    #[instrument(skip(self, form))]
    pub async fn update_profile(&self, id: i64, form: &ProfileForm) -> Result<ServerProfile> {
        form.validate()?;
        let update = ProfileUpdate {
            name: form.name.trim(),
            description: &form.description,
            region: &form.region,
            id_server: form.id_server.trim(),
            relay_server: &form.relay_server,
            api_server: &form.api_server,
            access_key: &form.key,
            priority: form.priority,
            is_enabled: form.is_enabled,
            is_default: form.is_default,
        };
        let profile = self.db.update_profile(id, &update).await?;
        info!("Server profile updated");
        Ok(profile)
    }

    pub async fn profile_detail(&self, id: i64) -> Result<ServerProfile> {
        Ok(self.db.get_profile(id).await?)
    }

    pub async fn list_profiles(
        &self,
        filter: &ProfileFilter,
        request: PageRequest,
    ) -> Result<Paged<ServerProfile>> {
        let page = self.page(request);
        let items = self.db.list_profiles(filter, page).await?;
        let total = self.db.count_profiles(filter).await?;
        Ok(Paged {
            items,
            total,
            page: page.number,
            page_size: page.size,
        })
    }

    /// Delete a profile that no config code references.
    #[instrument(skip(self))]
    pub async fn delete_profile(&self, id: i64) -> Result<()> {
        match self.db.delete_profile_if_unreferenced(id).await? {
            ProfileDeleteOutcome::Deleted => {
                info!("Server profile deleted");
                Ok(())
            }
            ProfileDeleteOutcome::NotFound => Err(EngineError::NotFound(format!("Profile {id}"))),
            ProfileDeleteOutcome::InUse(count) => Err(EngineError::ProfileInUse(count)),
        }
    }

    /// Make `id` the only default profile.
    #[instrument(skip(self))]
    pub async fn set_default(&self, id: i64) -> Result<()> {
        self.db.set_default_profile(id).await?;
        info!("Default server profile changed");
        Ok(())
    }

    /// The enabled default profile.
    pub async fn get_default(&self) -> Result<ServerProfile> {
        self.db
            .get_default_profile()
            .await?
            .ok_or_else(|| EngineError::NotFound("Default profile".to_string()))
    }
}
