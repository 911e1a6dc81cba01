//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A release line: branch or tag name in the meta repository (e.g. `main`).
pub type GitRef = String;

/// An opaque content hash identifying a component revision (a commit SHA).
pub type Revision = String;

/// A raw configuration key in a running deployment.
pub type ConfigKey = String;

/// A user id assigned by a running deployment.
pub type UserId = u64;
