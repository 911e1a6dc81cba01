//! Error types.
//!
//! Each concern owns its own error enum; they fold into [`Error`] so
//! command handlers can use a single `Result` alias and `?`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::component::Component;
use crate::core::manage::ManageError;
use crate::core::secrets::SecretName;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("resolving component versions: {0}")]
    Resolve(#[from] ResolveError),

    #[error("rendering deployment descriptor: {0}")]
    Render(#[from] RenderError),

    #[error("provisioning secrets: {0}")]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Manage(#[from] ManageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Bootstrap phase an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    Render,
    Provision,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Resolve => "resolve",
            Phase::Render => "render",
            Phase::Provision => "provision",
        };
        f.write_str(name)
    }
}

impl Error {
    /// The bootstrap phase that failed, if this is a bootstrap error.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Resolve(_) => Some(Phase::Resolve),
            Error::Render(_) => Some(Phase::Render),
            Error::Secret(_) => Some(Phase::Provision),
            _ => None,
        }
    }
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unable to determine {0} directory")]
    NoDirectory(&'static str),
}

/// Version resolution errors.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("release ref must not be empty")]
    EmptyRef,

    #[error("request to version source failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("version source returned HTTP {status} for ref '{git_ref}'")]
    Status { status: u16, git_ref: String },

    #[error("malformed component listing: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("listing entry '{name}' has invalid revision {revision:?}")]
    InvalidRevision { name: String, revision: String },

    #[error("version source did not answer within {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,
}

/// Descriptor rendering errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid template '{name}': {reason}")]
    Parse { name: String, reason: String },

    #[error("no revision resolved for {component} (template key '{key}')", key = .component.template_key())]
    MissingRevision { component: Component },

    #[error("failed to render '{name}': {reason}")]
    Evaluate { name: String, reason: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Secret provisioning and loading errors.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("random source failed for {name}: {source}")]
    Entropy {
        name: SecretName,
        #[source]
        source: std::io::Error,
    },

    #[error("random source returned {got} of {expected} bytes for {name}")]
    ShortRead {
        name: SecretName,
        got: usize,
        expected: usize,
    },

    #[error("secret {name} is missing")]
    Missing { name: SecretName },

    #[error("existing secret {name} has {len} bytes, expected {expected}")]
    Corrupt {
        name: SecretName,
        len: u64,
        expected: usize,
    },

    #[error("secret {name} has {len} bytes, expected {expected}")]
    InvalidLength {
        name: SecretName,
        len: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
