//! Runtime-mutable system settings.
//!
//! Held in memory behind [`SharedSettings`]. Readers take a snapshot; the
//! admin update path validates a complete replacement and swaps it in under
//! the write lock.
//!
//! Only `token_expire` is consumed here (login token lifetime). The other
//! fields are display-only settings kept for the admin console.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Shortest accepted admin token lifetime.
const MIN_TOKEN_EXPIRE: Duration = Duration::from_secs(60);

/// Longest accepted admin token lifetime.
const MAX_TOKEN_EXPIRE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("token_expire: {0}")]
    TokenExpire(String),

    #[error("{0} must not be negative")]
    Negative(&'static str),
}

/// Effective system settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSettings {
    /// 0 means unlimited.
    pub max_concurrent_devices: i64,
    pub register: bool,
    pub register_status: i64,
    pub captcha_threshold: i64,
    pub ban_threshold: i64,
    pub disable_pwd_login: bool,
    pub web_client: i64,
    pub web_sso: bool,
    /// Lifetime of admin access tokens issued from now on.
    pub token_expire: Duration,
}

impl SystemSettings {
    /// Defaults with the given token lifetime.
    pub const fn with_token_expire(token_expire: Duration) -> Self {
        Self {
            max_concurrent_devices: 0,
            register: false,
            register_status: 1,
            captcha_threshold: 3,
            ban_threshold: 0,
            disable_pwd_login: false,
            web_client: 1,
            web_sso: false,
            token_expire,
        }
    }

    /// Token lifetime in whole seconds.
    pub fn token_ttl_secs(&self) -> i64 {
        i64::try_from(self.token_expire.as_secs()).unwrap_or(i64::MAX)
    }
}

/// Wire form of [`SystemSettings`]; `token_expire` is a duration string
/// such as `"168h"` or `"30m"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettingsDto {
    pub max_concurrent_devices: i64,
    pub register: bool,
    pub register_status: i64,
    pub captcha_threshold: i64,
    pub ban_threshold: i64,
    pub disable_pwd_login: bool,
    pub web_client: i64,
    pub web_sso: bool,
    pub token_expire: String,
}

impl From<&SystemSettings> for SystemSettingsDto {
    fn from(s: &SystemSettings) -> Self {
        Self {
            max_concurrent_devices: s.max_concurrent_devices,
            register: s.register,
            register_status: s.register_status,
            captcha_threshold: s.captcha_threshold,
            ban_threshold: s.ban_threshold,
            disable_pwd_login: s.disable_pwd_login,
            web_client: s.web_client,
            web_sso: s.web_sso,
            token_expire: humantime::format_duration(s.token_expire).to_string(),
        }
    }
}

impl TryFrom<SystemSettingsDto> for SystemSettings {
    type Error = SettingsError;

    fn try_from(dto: SystemSettingsDto) -> Result<Self, Self::Error> {
        for (name, value) in [
            ("max_concurrent_devices", dto.max_concurrent_devices),
            ("captcha_threshold", dto.captcha_threshold),
            ("ban_threshold", dto.ban_threshold),
        ] {
            if value < 0 {
                return Err(SettingsError::Negative(name));
            }
        }

        let token_expire = humantime::parse_duration(dto.token_expire.trim())
            .map_err(|e| SettingsError::TokenExpire(e.to_string()))?;
        if !(MIN_TOKEN_EXPIRE..=MAX_TOKEN_EXPIRE).contains(&token_expire) {
            return Err(SettingsError::TokenExpire(
                "must be between 1m and 365d".to_string(),
            ));
        }

        Ok(Self {
            max_concurrent_devices: dto.max_concurrent_devices,
            register: dto.register,
            register_status: dto.register_status,
            captcha_threshold: dto.captcha_threshold,
            ban_threshold: dto.ban_threshold,
            disable_pwd_login: dto.disable_pwd_login,
            web_client: dto.web_client,
            web_sso: dto.web_sso,
            token_expire,
        })
    }
}

/// Process-wide settings holder.
#[derive(Debug, Clone)]
pub struct SharedSettings(Arc<RwLock<SystemSettings>>);

impl SharedSettings {
    pub fn new(initial: SystemSettings) -> Self {
        Self(Arc::new(RwLock::new(initial)))
    }

    /// Copy of the current settings.
    pub async fn snapshot(&self) -> SystemSettings {
        self.0.read().await.clone()
    }

    /// Replace the settings wholesale.
    pub async fn replace(&self, next: SystemSettings) {
        *self.0.write().await = next;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dto() -> SystemSettingsDto {
        SystemSettingsDto::from(&SystemSettings::with_token_expire(Duration::from_secs(3600)))
    }

    #[test]
    fn dto_renders_duration_text() {
        assert_eq!(dto().token_expire, "1h");
    }

    #[test]
    fn dto_roundtrip() {
        let mut d = dto();
        d.token_expire = "168h".to_string();
        d.register = true;
        let settings = SystemSettings::try_from(d).unwrap();
        assert_eq!(settings.token_expire, Duration::from_secs(168 * 3600));
        assert_eq!(settings.token_ttl_secs(), 168 * 3600);
        assert!(settings.register);
    }

    #[test]
    fn unparsable_duration_rejected() {
        let mut d = dto();
        d.token_expire = "soon".to_string();
        assert!(matches!(
            SystemSettings::try_from(d),
            Err(SettingsError::TokenExpire(_))
        ));
    }

    #[test]
    fn out_of_range_duration_rejected() {
        let mut d = dto();
        d.token_expire = "5s".to_string();
        assert!(SystemSettings::try_from(d).is_err());
    }

    #[test]
    fn negative_threshold_rejected() {
        let mut d = dto();
        d.ban_threshold = -1;
        assert!(matches!(
            SystemSettings::try_from(d),
            Err(SettingsError::Negative("ban_threshold"))
        ));
    }

    #[tokio::test]
    async fn replace_is_visible_to_new_snapshots() {
        let shared = SharedSettings::new(SystemSettings::with_token_expire(Duration::from_secs(60)));
        let before = shared.snapshot().await;

        let mut next = before.clone();
        next.web_sso = true;
        shared.replace(next.clone()).await;

        assert!(!before.web_sso);
        assert_eq!(shared.snapshot().await, next);
    }
}
