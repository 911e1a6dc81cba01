//! Constants used throughout openslides-manage.
//!
//! Centralizes well-known file names and deployment defaults.

/// Application directory name under the user's data and config dirs.
pub const APP_NAME: &str = "openslides";

/// Rendered descriptor file name, relative to the data directory.
pub const DESCRIPTOR_FILE: &str = "docker-compose.yml";

/// Secret store directory name, relative to the data directory.
pub const SECRETS_DIR: &str = "secrets";

/// Configuration file name inside the config directory.
pub const CONFIG_FILE: &str = "manage.toml";

/// Size of every secret record in bytes (256 bits).
pub const SECRET_LEN: usize = 32;

/// Release line resolved when none is given.
pub const DEFAULT_REF: &str = "main";

/// Externally exposed HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Externally exposed management port.
pub const DEFAULT_MANAGE_PORT: u16 = 9008;

/// Deadline for a bootstrap run, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base URL of the component version source.
pub const DEFAULT_SOURCE_URL: &str = "https://api.github.com";

/// Repository whose top-level listing pins every component.
pub const META_REPOSITORY: &str = "OpenSlides/OpenSlides";
