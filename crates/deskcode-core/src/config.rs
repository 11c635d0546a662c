//! Configuration resolution for `DeskCode`.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/deskcode/settings.json)
//! 3. Explicit config file (`--config`), superseding the global file
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)
//!
//! Secrets are never read from config files.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete `DeskCode` configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub codes: CodeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 21114)),
            database_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Config-code issuance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    /// Namespace tag at the start of every code.
    pub prefix: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Upper bound for one batch-generate call.
    pub max_batch: u32,
    /// Offline codes older than this are rejected on decode.
    pub offline_max_age_secs: i64,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            prefix: "KUST".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            max_batch: 100,
            offline_max_age_secs: 365 * 24 * 60 * 60, // 1 year
        }
    }
}

/// Admin authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 3600,
        }
    }
}

impl Config {
    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.codes.prefix.is_empty()
            || !self
                .codes
                .prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(Error::Config(format!(
                "codes.prefix must be non-empty ASCII alphanumeric, got {:?}",
                self.codes.prefix
            )));
        }
        if self.codes.default_page_size == 0
            || self.codes.default_page_size > self.codes.max_page_size
        {
            return Err(Error::Config(
                "codes.default_page_size must be in 1..=codes.max_page_size".to_string(),
            ));
        }
        if self.codes.max_batch == 0 {
            return Err(Error::Config("codes.max_batch must be positive".to_string()));
        }
        if self.auth.access_ttl_secs <= 0 {
            return Err(Error::Config(
                "auth.access_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            config = load_config_file(&global_path)?;
        }
    }

    if let Some(path) = explicit {
        // An explicitly requested file must exist.
        config = load_config_file(path)?;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".deskcode").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/deskcode/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("deskcode").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Default database path for the server.
pub fn database_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".deskcode").join("deskcode.db"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/deskcode/deskcode.db"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_DATA_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".local").join("share"))
            })
            .map(|p| p.join("deskcode").join("deskcode.db"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `DESKCODE_*` overrides. `lookup` abstracts the environment.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("DESKCODE_ADDR") {
        if let Ok(addr) = val.parse() {
            config.server.addr = addr;
        }
    }
    if let Some(val) = lookup("DESKCODE_DB_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = lookup("DESKCODE_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Some(val) = lookup("DESKCODE_CODE_PREFIX") {
        config.codes.prefix = val;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.codes.prefix, "KUST");
        assert_eq!(config.codes.max_batch, 100);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"codes": {"prefix": "ACME"}}"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.codes.prefix, "ACME");
        assert_eq!(config.codes.default_page_size, 20);
        assert_eq!(config.auth.access_ttl_secs, 3600);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(load_config_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("DESKCODE_ADDR", "127.0.0.1:9000"),
            ("DESKCODE_CODE_PREFIX", "TEST"),
            ("DESKCODE_DB_PATH", "/tmp/x.db"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.server.addr.port(), 9000);
        assert_eq!(config.codes.prefix, "TEST");
        assert_eq!(config.server.database_path, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn invalid_prefix_rejected() {
        let mut config = Config::default();
        config.codes.prefix = "BAD-TAG".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn page_size_above_max_rejected() {
        let mut config = Config::default();
        config.codes.default_page_size = 500;
        assert!(config.validate().is_err());
    }
}
