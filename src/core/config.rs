//! Configuration file management.
//!
//! Handles reading and validating `manage.toml`. Every field has a default,
//! so a missing default file is equivalent to an empty one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::types::GitRef;
use crate::error::{ConfigError, Result};

/// What to do with descriptor and secret files that already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingPolicy {
    /// Leave existing files untouched, create only what is missing.
    #[default]
    Keep,
    /// Regenerate everything.
    Overwrite,
}

/// Configuration stored in `manage.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// The `[bootstrap]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Release line to pin components to.
    #[serde(rename = "ref")]
    pub git_ref: GitRef,
    pub http_port: u16,
    pub manage_port: u16,
    /// Deadline for a whole bootstrap run.
    pub timeout_secs: u64,
    /// Base URL of the version source API.
    pub source_url: String,
    pub existing: ExistingPolicy,
    /// Where the descriptor and secret store live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            git_ref: constants::DEFAULT_REF.to_string(),
            http_port: constants::DEFAULT_HTTP_PORT,
            manage_port: constants::DEFAULT_MANAGE_PORT,
            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
            source_url: constants::DEFAULT_SOURCE_URL.to_string(),
            existing: ExistingPolicy::default(),
            data_dir: None,
        }
    }
}

impl BootstrapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured data directory, or `<data_dir>/openslides`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoDirectory` if no data directory is configured
    /// and the platform has none.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}

impl Config {
    /// Default config file location (`<config_dir>/openslides/manage.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::APP_NAME).join(constants::CONFIG_FILE))
    }

    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one, the default
    /// location is tried and defaults are used if nothing is there.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` for a missing explicit file,
    /// `ConfigError::Parse` for malformed TOML, or a validation error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()).into());
                }
                p.to_path_buf()
            }
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        let config = Self::from_toml(&contents)?;

        debug!(git_ref = %config.bootstrap.git_ref, "config loaded");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` or a validation error.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Checks:
    /// - ref is not empty and has no whitespace, control characters, quotes or colons
    /// - ports are non-zero and distinct
    /// - timeout is positive
    /// - source URL is not empty
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on the first violation.
    pub fn validate(&self) -> Result<()> {
        let b = &self.bootstrap;
        let invalid = |field, reason: &str| -> crate::error::Error {
            ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            }
            .into()
        };

        if b.git_ref.trim().is_empty() {
            return Err(invalid("ref", "must not be empty"));
        }
        // Not valid in git ref names, and would break out of the descriptor.
        if b.git_ref
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\\' | ':'))
        {
            return Err(invalid("ref", "must be a branch, tag or commit name"));
        }
        if b.http_port == 0 {
            return Err(invalid("http_port", "must not be 0"));
        }
        if b.manage_port == 0 {
            return Err(invalid("manage_port", "must not be 0"));
        }
        if b.http_port == b.manage_port {
            return Err(invalid("manage_port", "must differ from http_port"));
        }
        if b.timeout_secs == 0 {
            return Err(invalid("timeout_secs", "must be greater than 0"));
        }
        if b.source_url.trim().is_empty() {
            return Err(invalid("source_url", "must not be empty"));
        }

        Ok(())
    }
}

/// `<data_dir>/openslides`.
///
/// # Errors
///
/// Returns `ConfigError::NoDirectory` if the platform has no data directory.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join(constants::APP_NAME))
        .ok_or_else(|| ConfigError::NoDirectory("data").into())
}
