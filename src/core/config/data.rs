use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::export::DEFAULT_ARCHIVE_NAME;
use crate::utils::url::construct_api_url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8787";
pub const DEFAULT_GENERATE_PATH: &str = "api/generate";
pub const DEFAULT_API_KEY_ENV: &str = "EXTSHIFT_API_KEY";
pub const BASE_URL_ENV: &str = "EXTSHIFT_BASE_URL";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the generation service
    pub base_url: Option<String>,
    /// Path of the streaming generation endpoint, relative to `base_url`
    pub generate_path: Option<String>,
    /// Name of the environment variable holding the bearer token
    pub api_key_env: Option<String>,
    /// File name used by "download all" when more than one file is loaded
    pub archive_name: Option<String>,
    /// Directory for persisted session state
    pub state_dir: Option<PathBuf>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    /// The base URL, preferring `EXTSHIFT_BASE_URL` over the config file.
    pub fn base_url(&self) -> String {
        std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn endpoint(&self) -> String {
        let path = self
            .generate_path
            .as_deref()
            .unwrap_or(DEFAULT_GENERATE_PATH);
        construct_api_url(&self.base_url(), path)
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(self.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn archive_name(&self) -> &str {
        self.archive_name.as_deref().unwrap_or(DEFAULT_ARCHIVE_NAME)
    }
}
