//! Client side of the management interface.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::{DomainError, DomainErrorKind, ManageError};
use super::messages::*;
use super::{Manage, Operation};

/// Calls a [`Manage`] implementation with a per-call deadline.
///
/// Cheap to clone; clones share the same server.
#[derive(Clone)]
pub struct ManageClient {
    server: Arc<dyn Manage>,
    timeout: Duration,
}

impl ManageClient {
    pub fn new(server: Arc<dyn Manage>, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn call<T, F>(&self, op: Operation, fut: F) -> Result<T, ManageError>
    where
        F: Future<Output = Result<T, ManageError>>,
    {
        debug!(method = %op.path(), "calling");
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Err(e)) if e.is_unimplemented() => {
                warn!(method = %op.path(), "server does not implement method");
                Err(e)
            }
            Ok(result) => result,
            Err(_) => Err(DomainError::new(
                DomainErrorKind::DeadlineExceeded,
                format!("{} did not answer within {:?}", op, self.timeout),
            )
            .into()),
        }
    }

    pub async fn check_server(&self) -> Result<CheckServerResponse, ManageError> {
        self.call(
            Operation::CheckServer,
            self.server.check_server(CheckServerRequest::default()),
        )
        .await
    }

    pub async fn initial_data(&self, req: InitialDataRequest) -> Result<InitialDataResponse, ManageError> {
        self.call(Operation::InitialData, self.server.initial_data(req))
            .await
    }

    pub async fn migrations(&self, command: MigrationCommand) -> Result<MigrationsResponse, ManageError> {
        self.call(
            Operation::Migrations,
            self.server.migrations(MigrationsRequest { command }),
        )
        .await
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<CreateUserResponse, ManageError> {
        self.call(Operation::CreateUser, self.server.create_user(req))
            .await
    }

    pub async fn set_password(&self, req: SetPasswordRequest) -> Result<SetPasswordResponse, ManageError> {
        self.call(Operation::SetPassword, self.server.set_password(req))
            .await
    }

    pub async fn get(&self, key: &str) -> Result<String, ManageError> {
        let req = GetRequest {
            key: key.to_string(),
        };
        self.call(Operation::Get, self.server.get(req))
            .await
            .map(|resp| resp.value)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), ManageError> {
        let req = SetRequest {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.call(Operation::Set, self.server.set(req)).await?;
        Ok(())
    }

    pub async fn version(&self) -> Result<VersionResponse, ManageError> {
        self.call(Operation::Version, self.server.version(VersionRequest::default()))
            .await
    }

    pub async fn health(&self) -> Result<HealthResponse, ManageError> {
        self.call(Operation::Health, self.server.health(HealthRequest::default()))
            .await
    }

    /// Operations the server implements.
    ///
    /// Probes only read-only operations; mutating operations cannot be
    /// probed without side effects.
    pub async fn supported_read_operations(&self) -> Vec<Operation> {
        let mut supported = Vec::new();
        for op in Operation::ALL.into_iter().filter(|o| o.is_read_only()) {
            let result = match op {
                Operation::CheckServer => self.check_server().await.map(drop),
                Operation::Get => self.get("").await.map(drop),
                Operation::Version => self.version().await.map(drop),
                Operation::Health => self.health().await.map(drop),
                _ => continue,
            };
            if !matches!(result, Err(ref e) if e.is_unimplemented()) {
                supported.push(op);
            }
        }
        supported
    }
}
