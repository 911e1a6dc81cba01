//! Management operations exposed by a running deployment.
//!
//! [`Manage`] is the capability interface: one method per operation, each
//! defaulting to [`ManageError::Unimplemented`]. A server overrides what its
//! build supports; clients can tell a missing capability from a failure.
//!
//! Transport is not part of this module. Implementations must be safe to
//! call concurrently; each call is independent.
//!
//! ## Example
//!
//! ```ignore
//! struct Probe;
//!
//! #[async_trait]
//! impl Manage for Probe {
//!     async fn check_server(&self, _req: CheckServerRequest) -> Result<CheckServerResponse, ManageError> {
//!         Ok(CheckServerResponse { ready: true })
//!     }
//! }
//! ```

use std::fmt;

use async_trait::async_trait;

mod client;
mod error;
mod memory;
pub mod messages;

pub use client::ManageClient;
pub use error::{DomainError, DomainErrorKind, ErrorKind, ManageError};
pub use memory::MemoryDeployment;
pub use messages::*;

/// Service name used in operation paths.
pub const SERVICE_NAME: &str = "Manage";

/// The fixed set of management operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    CheckServer,
    InitialData,
    Migrations,
    CreateUser,
    SetPassword,
    Get,
    Set,
    Version,
    Health,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::CheckServer,
        Operation::InitialData,
        Operation::Migrations,
        Operation::CreateUser,
        Operation::SetPassword,
        Operation::Get,
        Operation::Set,
        Operation::Version,
        Operation::Health,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::CheckServer => "CheckServer",
            Operation::InitialData => "InitialData",
            Operation::Migrations => "Migrations",
            Operation::CreateUser => "CreateUser",
            Operation::SetPassword => "SetPassword",
            Operation::Get => "Get",
            Operation::Set => "Set",
            Operation::Version => "Version",
            Operation::Health => "Health",
        }
    }

    /// Full method path, e.g. `/Manage/CheckServer`.
    pub fn path(self) -> String {
        format!("/{}/{}", SERVICE_NAME, self.name())
    }

    /// Whether the operation only reads deployment state.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Operation::CheckServer | Operation::Get | Operation::Version | Operation::Health
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Management capability interface.
#[async_trait]
pub trait Manage: Send + Sync {
    /// Liveness probe. No side effects.
    async fn check_server(&self, _req: CheckServerRequest) -> Result<CheckServerResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::CheckServer))
    }

    /// Load initial data. Must not overwrite a populated deployment.
    async fn initial_data(&self, _req: InitialDataRequest) -> Result<InitialDataResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::InitialData))
    }

    /// Query or apply schema migrations; reports state and counts.
    async fn migrations(&self, _req: MigrationsRequest) -> Result<MigrationsResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::Migrations))
    }

    /// Create a user. Usernames are unique.
    async fn create_user(&self, _req: CreateUserRequest) -> Result<CreateUserResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::CreateUser))
    }

    /// Set a user's password. The response never carries the credential.
    async fn set_password(&self, _req: SetPasswordRequest) -> Result<SetPasswordResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::SetPassword))
    }

    /// Read a raw configuration key. An absent key is `NotFound`.
    async fn get(&self, _req: GetRequest) -> Result<GetResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::Get))
    }

    /// Write a raw configuration key, atomically per key.
    async fn set(&self, _req: SetRequest) -> Result<SetResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::Set))
    }

    /// Report running component versions.
    async fn version(&self, _req: VersionRequest) -> Result<VersionResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::Version))
    }

    /// Structured health report.
    async fn health(&self, _req: HealthRequest) -> Result<HealthResponse, ManageError> {
        Err(ManageError::Unimplemented(Operation::Health))
    }
}

/// A server that implements nothing.
///
/// Embed-by-delegation base for partial servers, and a stand-in for builds
/// that expose no management capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unimplemented;

impl Manage for Unimplemented {}
