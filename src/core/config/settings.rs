//! `set` / `unset` handling for config keys.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::core::config::data::Config;
use crate::utils::url::is_http_url;

pub const CONFIG_KEYS: &[&str] = &[
    "base-url",
    "generate-path",
    "api-key-env",
    "archive-name",
    "state-dir",
];

#[derive(Debug, PartialEq, Eq)]
pub enum SettingError {
    UnknownKey(String),
    InvalidValue { key: &'static str, reason: String },
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {key} (expected one of: {})",
                CONFIG_KEYS.join(", ")
            ),
            SettingError::InvalidValue { key, reason } => {
                write!(f, "Invalid value for {key}: {reason}")
            }
        }
    }
}

impl Error for SettingError {}

fn non_empty(key: &'static str, value: &str) -> Result<String, SettingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(SettingError::InvalidValue {
            key,
            reason: "value must not be empty".to_string(),
        })
    } else {
        Ok(trimmed.to_string())
    }
}

impl Config {
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), SettingError> {
        match key {
            "base-url" => {
                let url = non_empty("base-url", value)?;
                if !is_http_url(&url) {
                    return Err(SettingError::InvalidValue {
                        key: "base-url",
                        reason: "must start with http:// or https://".to_string(),
                    });
                }
                self.base_url = Some(url);
            }
            "generate-path" => self.generate_path = Some(non_empty("generate-path", value)?),
            "api-key-env" => self.api_key_env = Some(non_empty("api-key-env", value)?),
            "archive-name" => {
                let name = non_empty("archive-name", value)?;
                if name.contains(&['/', '\\'][..]) {
                    return Err(SettingError::InvalidValue {
                        key: "archive-name",
                        reason: "must be a file name, not a path".to_string(),
                    });
                }
                self.archive_name = Some(name);
            }
            "state-dir" => self.state_dir = Some(PathBuf::from(non_empty("state-dir", value)?)),
            other => return Err(SettingError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), SettingError> {
        match key {
            "base-url" => self.base_url = None,
            "generate-path" => self.generate_path = None,
            "api-key-env" => self.api_key_env = None,
            "archive-name" => self.archive_name = None,
            "state-dir" => self.state_dir = None,
            other => return Err(SettingError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}
