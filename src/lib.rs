//! openslides-manage - bootstrap and management control plane for OpenSlides.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── start         # Generate descriptor and secrets
//! │   ├── status        # Inspect a deployment directory
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # manage.toml handling
//!     ├── component     # Upstream components and resolved revisions
//!     ├── resolver      # Version resolution against the meta repository
//!     ├── render        # docker-compose.yml rendering (tera)
//!     ├── secrets       # Secret store provisioning
//!     ├── bootstrap     # Phase orchestration
//!     └── manage/       # Management operation contract
//!         ├── mod       # Manage trait, Operation
//!         ├── client    # Deadline-bounded client
//!         └── memory    # In-process reference server
//! ```
//!
//! # Bootstrap
//!
//! A run resolves the revision of every component at a release line,
//! renders a descriptor pinned to those revisions, then creates the secret
//! store. Any failure stops the run and names the phase.

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::bootstrap::{Bootstrap, Layout, Outcome, Report};
pub use crate::core::config::{Config, ExistingPolicy};
pub use crate::error::{Error, Phase, Result};
