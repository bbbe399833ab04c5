//! User configuration from `config.toml`.
//!
//! Loading never fails: a missing file gives defaults, an unreadable or
//! malformed one is logged and also gives defaults. Fields absent from the
//! file keep their default values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::VersionPolicy;

const APP_DIR: &str = "catcheck";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REFRESH_SECS: u64 = 300;
pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub theme: String,
    /// Period of the background sheet refresh; 0 disables it.
    pub refresh_interval_secs: u64,
    /// Page size requested from `/get_last_responses`.
    pub per_page: u32,
    /// Number of cards revealed at a time by "load more".
    pub page_size: usize,
    pub version_policy: VersionPolicy,
    pub default_assistant: Option<String>,
    pub default_sheet: Option<String>,
    pub notification_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            theme: "catppuccin-mocha".to_owned(),
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            per_page: DEFAULT_PER_PAGE,
            page_size: 10,
            version_policy: VersionPolicy::default(),
            default_assistant: None,
            default_sheet: None,
            notification_ttl_secs: 4,
        }
    }
}

impl Config {
    /// Loads the config at `path`, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {:?}", path);
                    config.sanitized()
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Loads from the default location.
    pub fn load_default() -> Self {
        Self::load(&config_path())
    }

    fn sanitized(mut self) -> Self {
        if self.per_page == 0 {
            self.per_page = DEFAULT_PER_PAGE;
        }
        if self.page_size == 0 {
            self.page_size = Self::default().page_size;
        }
        self
    }
}

/// `$XDG_CONFIG_HOME/catcheck/config.toml`, else `~/.config/catcheck/config.toml`.
pub fn config_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join(APP_DIR).join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            backend_url = "http://checker.local"
            version_policy = "append"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_url, "http://checker.local");
        assert_eq!(config.version_policy, VersionPolicy::Append);
        assert_eq!(config.refresh_interval_secs, 300);
        assert_eq!(config.per_page, 10);
    }

    #[test]
    fn zero_sizes_are_replaced() {
        let config = Config {
            per_page: 0,
            page_size: 0,
            ..Config::default()
        }
        .sanitized();
        assert_eq!(config.per_page, DEFAULT_PER_PAGE);
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn config_path_ends_with_app_dir() {
        assert!(config_path().ends_with("catcheck/config.toml"));
    }
}
