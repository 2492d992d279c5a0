//! Configuration and directory management shared by herd clients.
//!
//! Directory layout:
//! ```text
//! <config dir>/herd/
//! ├── config.json      # persisted settings (API address, SSO origin)
//! └── session.json     # client-side session store
//! ```
//!
//! Environment variables take precedence over `config.json`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_API_URL: &str = "HERD_API_URL";
pub const ENV_AUTH_ORIGIN: &str = "HERD_AUTH_ORIGIN";
pub const ENV_SSO_CLIENT_ID: &str = "HERD_SSO_CLIENT_ID";
pub const ENV_CONFIG_DIR: &str = "HERD_CONFIG_DIR";

/// Default origin of the SSO front-end.
pub const DEFAULT_AUTH_ORIGIN: &str = "http://localhost:3000";

/// Settings persisted in `config.json`.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_origin: Option<String>,
}

/// Effective client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HerdConfig {
    /// Public API address; `None` lets the client fall back to localhost.
    pub api_url: Option<String>,
    pub auth_origin: String,
    /// OAuth client registered with the Auth.js server. Only its presence
    /// matters here: it switches SSO sign-out on. The matching secret stays
    /// on the Auth.js server and is never read by clients.
    pub sso_client_id: Option<String>,
    pub config_dir: PathBuf,
}

impl HerdConfig {
    /// Load from the environment layered over `config.json`.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config_dir = var(ENV_CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_config_dir);
        let persisted = load_settings(&config_dir);

        HerdConfig {
            api_url: var(ENV_API_URL).or(persisted.api_url),
            auth_origin: var(ENV_AUTH_ORIGIN)
                .or(persisted.auth_origin)
                .unwrap_or_else(|| DEFAULT_AUTH_ORIGIN.to_string()),
            sso_client_id: var(ENV_SSO_CLIENT_ID),
            config_dir,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        settings_path(&self.config_dir)
    }

    pub fn session_path(&self) -> PathBuf {
        self.config_dir.join("session.json")
    }

    pub fn sso_enabled(&self) -> bool {
        self.sso_client_id.is_some()
    }
}

/// `<user config dir>/herd`, or `./herd` when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("herd"))
        .unwrap_or_else(|| PathBuf::from("herd"))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("config.json")
}

/// Read `config.json`; missing or unreadable files yield defaults.
pub fn load_settings(config_dir: &Path) -> PersistedSettings {
    let path = settings_path(config_dir);
    if !path.exists() {
        return PersistedSettings::default();
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<PersistedSettings>(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to parse config file at {:?}: {}", path, e);
                PersistedSettings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config file at {:?}: {}", path, e);
            PersistedSettings::default()
        }
    }
}

/// Write `config.json`, creating the directory if needed.
pub fn save_settings(config_dir: &Path, settings: &PersistedSettings) -> anyhow::Result<()> {
    ensure_dir(config_dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(settings_path(config_dir), json)?;
    Ok(())
}

/// Ensure a single directory exists
pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        info!("Created directory: {:?}", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_anything() {
        let dir = tempfile::tempdir().unwrap();
        let config = HerdConfig::from_lookup(lookup(HashMap::from([(
            ENV_CONFIG_DIR,
            dir.path().to_string_lossy().to_string(),
        )])));
        assert_eq!(config.api_url, None);
        assert_eq!(config.auth_origin, DEFAULT_AUTH_ORIGIN);
        assert!(!config.sso_enabled());
        assert_eq!(config.session_path(), dir.path().join("session.json"));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        save_settings(
            dir.path(),
            &PersistedSettings {
                api_url: Some("https://file.example/api/v1".into()),
                auth_origin: Some("https://file.example".into()),
            },
        )
        .unwrap();

        let from_file = HerdConfig::from_lookup(lookup(HashMap::from([(
            ENV_CONFIG_DIR,
            dir.path().to_string_lossy().to_string(),
        )])));
        assert_eq!(from_file.api_url.as_deref(), Some("https://file.example/api/v1"));
        assert_eq!(from_file.auth_origin, "https://file.example");

        let from_env = HerdConfig::from_lookup(lookup(HashMap::from([
            (ENV_CONFIG_DIR, dir.path().to_string_lossy().to_string()),
            (ENV_API_URL, "https://env.example/api/v1".to_string()),
        ])));
        assert_eq!(from_env.api_url.as_deref(), Some("https://env.example/api/v1"));
    }

    #[test]
    fn test_blank_env_counts_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let config = HerdConfig::from_lookup(lookup(HashMap::from([
            (ENV_CONFIG_DIR, dir.path().to_string_lossy().to_string()),
            (ENV_API_URL, "   ".to_string()),
            (ENV_SSO_CLIENT_ID, "client".to_string()),
        ])));
        assert_eq!(config.api_url, None);
        assert!(config.sso_enabled());
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(settings_path(dir.path()), "{ not json").unwrap();
        assert_eq!(load_settings(dir.path()), PersistedSettings::default());
    }
}
