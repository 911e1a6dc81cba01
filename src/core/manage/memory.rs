//! In-process management server.
//!
//! Keeps all deployment state in memory behind one lock. Used as the
//! reference behaviour for the management contract and in tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::error::ManageError;
use super::messages::*;
use super::Manage;
use crate::core::component::Resolution;
use crate::core::secrets::SecretStore;
use crate::core::types::UserId;

struct User {
    username: String,
    is_admin: bool,
    salt: [u8; 16],
    password_hash: String,
}

struct Migrations {
    finalized: u32,
    applied: u32,
    target: u32,
}

impl Migrations {
    fn response(&self) -> MigrationsResponse {
        let state = if self.finalized >= self.target {
            MigrationState::NoMigrationRequired
        } else if self.applied >= self.target {
            MigrationState::FinalizationRequired
        } else {
            MigrationState::MigrationRequired
        };

        MigrationsResponse {
            state,
            current_migration_index: self.applied,
            target_migration_index: self.target,
            unfinalized: self.applied - self.finalized,
        }
    }
}

struct State {
    data: Option<serde_json::Value>,
    users: BTreeMap<UserId, User>,
    next_user_id: UserId,
    config: BTreeMap<String, String>,
    migrations: Migrations,
}

/// A deployment held entirely in memory.
pub struct MemoryDeployment {
    state: Mutex<State>,
    components: BTreeMap<String, String>,
    /// `Err` holds why the secret store could not be loaded.
    secrets: Result<(), String>,
}

impl Default for MemoryDeployment {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDeployment {
    /// Empty deployment: no data, no users, no pending migrations.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                data: None,
                users: BTreeMap::new(),
                next_user_id: 1,
                config: BTreeMap::new(),
                migrations: Migrations {
                    finalized: 0,
                    applied: 0,
                    target: 0,
                },
            }),
            components: BTreeMap::new(),
            secrets: Err("secret store not configured".to_string()),
        }
    }

    /// Report the given revisions from `Version`.
    pub fn with_resolution(mut self, resolution: &Resolution) -> Self {
        self.components = resolution
            .iter()
            .map(|(c, rev)| (c.repository().to_string(), rev.to_string()))
            .collect();
        self
    }

    /// Load the secret store the auth service would consume.
    ///
    /// A store that fails to load is reported by `Health`, not here.
    pub fn with_secret_store(mut self, dir: &Path) -> Self {
        self.secrets = SecretStore::load(dir).map(drop).map_err(|e| e.to_string());
        self
    }

    /// Start with `count` migrations pending.
    pub fn with_pending_migrations(self, count: u32) -> Self {
        self.lock().migrations.target = count;
        self
    }

    /// Whether `password` matches the stored credential of `user_id`.
    pub fn verify_password(&self, user_id: UserId, password: &Password) -> bool {
        self.lock()
            .users
            .get(&user_id)
            .map(|u| hash_password(&u.salt, password) == u.password_hash)
            .unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation is a single assignment or insert; a poisoned
        // lock still guards consistent state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn new_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

fn hash_password(salt: &[u8], password: &Password) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.expose().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl Manage for MemoryDeployment {
    async fn check_server(&self, _req: CheckServerRequest) -> Result<CheckServerResponse, ManageError> {
        Ok(CheckServerResponse { ready: true })
    }

    async fn initial_data(&self, req: InitialDataRequest) -> Result<InitialDataResponse, ManageError> {
        let mut state = self.lock();
        if state.data.is_some() {
            info!("deployment already holds data, not loading initial data");
            return Ok(InitialDataResponse { initialized: false });
        }

        let data = req.data.unwrap_or_else(|| {
            serde_json::json!({ "organization": { "1": { "name": "OpenSlides" } } })
        });
        if !data.is_object() {
            return Err(ManageError::invalid_argument("initial data must be a JSON object"));
        }

        state.data = Some(data);
        info!("initial data loaded");
        Ok(InitialDataResponse { initialized: true })
    }

    async fn migrations(&self, req: MigrationsRequest) -> Result<MigrationsResponse, ManageError> {
        let mut state = self.lock();
        let m = &mut state.migrations;

        match req.command {
            MigrationCommand::Stats => {}
            MigrationCommand::Migrate => m.applied = m.target,
            MigrationCommand::Finalize => {
                m.applied = m.target;
                m.finalized = m.target;
            }
            MigrationCommand::Reset => {
                if m.applied == m.finalized {
                    return Err(ManageError::conflict("no unfinalized migrations to reset"));
                }
                m.applied = m.finalized;
            }
        }

        let response = m.response();
        debug!(command = ?req.command, state = ?response.state, "migrations");
        Ok(response)
    }

    async fn create_user(&self, req: CreateUserRequest) -> Result<CreateUserResponse, ManageError> {
        let username = req.username.trim();
        if username.is_empty() {
            return Err(ManageError::invalid_argument("username must not be empty"));
        }
        if req.password.expose().is_empty() {
            return Err(ManageError::invalid_argument("password must not be empty"));
        }

        let mut state = self.lock();
        if state
            .users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(username))
        {
            return Err(ManageError::already_exists(format!(
                "user '{}' already exists",
                username
            )));
        }

        let user_id = state.next_user_id;
        state.next_user_id += 1;

        let salt = new_salt();
        let password_hash = hash_password(&salt, &req.password);
        state.users.insert(
            user_id,
            User {
                username: username.to_string(),
                is_admin: req.is_admin,
                salt,
                password_hash,
            },
        );

        info!(user_id, admin = req.is_admin, "user created");
        Ok(CreateUserResponse { user_id })
    }

    async fn set_password(&self, req: SetPasswordRequest) -> Result<SetPasswordResponse, ManageError> {
        if req.password.expose().is_empty() {
            return Err(ManageError::invalid_argument("password must not be empty"));
        }

        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&req.user_id)
            .ok_or_else(|| ManageError::NotFound(format!("user {}", req.user_id)))?;

        user.salt = new_salt();
        user.password_hash = hash_password(&user.salt, &req.password);

        debug!(user_id = req.user_id, admin = user.is_admin, "password set");
        Ok(SetPasswordResponse {})
    }

    async fn get(&self, req: GetRequest) -> Result<GetResponse, ManageError> {
        self.lock()
            .config
            .get(&req.key)
            .map(|value| GetResponse {
                value: value.clone(),
            })
            .ok_or_else(|| ManageError::NotFound(format!("key '{}'", req.key)))
    }

    async fn set(&self, req: SetRequest) -> Result<SetResponse, ManageError> {
        if req.key.is_empty() {
            return Err(ManageError::invalid_argument("key must not be empty"));
        }

        debug!(key = %req.key, "config key set");
        self.lock().config.insert(req.key, req.value);
        Ok(SetResponse {})
    }

    async fn version(&self, _req: VersionRequest) -> Result<VersionResponse, ManageError> {
        Ok(VersionResponse {
            components: self.components.clone(),
        })
    }

    async fn health(&self, _req: HealthRequest) -> Result<HealthResponse, ManageError> {
        let initialized = self.lock().data.is_some();

        let services = vec![
            ServiceHealth {
                name: "manage".to_string(),
                ready: true,
                detail: None,
            },
            ServiceHealth {
                name: "auth".to_string(),
                ready: self.secrets.is_ok(),
                detail: self.secrets.clone().err(),
            },
            ServiceHealth {
                name: "datastore".to_string(),
                ready: true,
                detail: (!initialized).then(|| "no initial data".to_string()),
            },
        ];

        Ok(HealthResponse {
            healthy: services.iter().all(|s| s.ready),
            services,
        })
    }
}
