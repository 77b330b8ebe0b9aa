use std::path::PathBuf;

use crate::authz::AuthzMode;
use crate::errors::ConfigError;

pub const DEFAULT_STORE_PREFIX: &str = "admin-console-";
pub const DEFAULT_SESSION_FILE: &str = "session.json";
pub const DEFAULT_MENU_FILE: &str = "menu.json";

/// Runtime settings read from the environment (and `.env`, when loaded).
#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub mode: AuthzMode,
    pub store_prefix: String,
    pub session_file: PathBuf,
    pub menu_file: PathBuf,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            mode: AuthzMode::Strict,
            store_prefix: DEFAULT_STORE_PREFIX.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            menu_file: PathBuf::from(DEFAULT_MENU_FILE),
        }
    }
}

impl GuardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    ///
    /// `AUTHZ_MODE` wins over the boolean `NEED_PERMISSION` alias when both are set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("NEED_PERMISSION") {
            config.mode = match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => AuthzMode::Strict,
                "false" | "0" | "no" => AuthzMode::Off,
                _ => return Err(ConfigError::invalid_value("NEED_PERMISSION", raw)),
            };
        }

        if let Some(raw) = lookup("AUTHZ_MODE") {
            config.mode = raw
                .parse()
                .map_err(|_| ConfigError::invalid_value("AUTHZ_MODE", raw.clone()))?;
        }

        if let Some(prefix) = lookup("STORE_PREFIX") {
            config.store_prefix = prefix;
        }
        if let Some(path) = lookup("SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(path) = lookup("MENU_FILE") {
            config.menu_file = PathBuf::from(path);
        }

        Ok(config)
    }
}
