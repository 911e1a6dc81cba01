//! Bootstrap orchestration.
//!
//! Runs the three phases in order: resolve component revisions, render the
//! descriptor, provision secrets. The first failure aborts the run. There is
//! no rollback: a descriptor written before a provisioning failure stays.

use std::io::Read;
use std::path::{Path, PathBuf};

use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::component::Resolution;
use crate::core::config::{BootstrapConfig, ExistingPolicy};
use crate::core::constants;
use crate::core::render::{self, DescriptorData, Renderer};
use crate::core::resolver::{self, VersionSource};
use crate::core::secrets::{OsEntropy, Provisioner, SecretName};
use crate::core::types::GitRef;
use crate::error::{ResolveError, Result};

/// What happened to one artifact during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Kept,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Written => f.write_str("written"),
            Outcome::Kept => f.write_str("kept"),
        }
    }
}

/// On-disk layout of a deployment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(constants::DESCRIPTOR_FILE)
    }

    pub fn secrets_dir(&self) -> PathBuf {
        self.root.join(constants::SECRETS_DIR)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub descriptor: Outcome,
    /// `None` when the descriptor was kept and nothing was resolved.
    pub resolution: Option<Resolution>,
    pub secrets: Vec<(SecretName, Outcome)>,
}

/// One bootstrap run.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    layout: Layout,
    git_ref: GitRef,
    http_port: u16,
    manage_port: u16,
    existing: ExistingPolicy,
}

impl Bootstrap {
    pub fn new(layout: Layout, git_ref: impl Into<GitRef>) -> Self {
        Self {
            layout,
            git_ref: git_ref.into(),
            http_port: constants::DEFAULT_HTTP_PORT,
            manage_port: constants::DEFAULT_MANAGE_PORT,
            existing: ExistingPolicy::default(),
        }
    }

    /// Build a run from the `[bootstrap]` configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoDirectory` if no data directory can be found.
    pub fn from_config(config: &BootstrapConfig) -> Result<Self> {
        Ok(Self::new(Layout::new(config.data_dir()?), config.git_ref.clone())
            .ports(config.http_port, config.manage_port)
            .existing(config.existing))
    }

    pub fn ports(mut self, http_port: u16, manage_port: u16) -> Self {
        self.http_port = http_port;
        self.manage_port = manage_port;
        self
    }

    pub fn existing(mut self, policy: ExistingPolicy) -> Self {
        self.existing = policy;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Run all phases with secrets drawn from the operating system CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns the first phase error; `Error::phase()` names the phase.
    pub async fn run<S>(&self, source: &S, deadline: Instant) -> Result<Report>
    where
        S: VersionSource + ?Sized,
    {
        self.run_with_entropy(source, deadline, OsEntropy).await
    }

    /// Run all phases with secrets drawn from `entropy`.
    ///
    /// # Errors
    ///
    /// Returns the first phase error; `Error::phase()` names the phase.
    pub async fn run_with_entropy<S, R>(
        &self,
        source: &S,
        deadline: Instant,
        entropy: R,
    ) -> Result<Report>
    where
        S: VersionSource + ?Sized,
        R: Read,
    {
        info!(
            git_ref = %self.git_ref,
            root = %self.layout.root().display(),
            policy = ?self.existing,
            "starting bootstrap"
        );

        let (descriptor, resolution) = self.descriptor_phase(source, deadline).await?;

        let secrets = Provisioner::with_entropy(self.layout.secrets_dir(), self.existing, entropy)
            .provision()?;

        info!("bootstrap finished");
        Ok(Report {
            descriptor,
            resolution,
            secrets,
        })
    }

    async fn descriptor_phase<S>(
        &self,
        source: &S,
        deadline: Instant,
    ) -> Result<(Outcome, Option<Resolution>)>
    where
        S: VersionSource + ?Sized,
    {
        let path = self.layout.descriptor_path();
        if self.existing == ExistingPolicy::Keep && path.exists() {
            info!(path = %path.display(), "descriptor exists, keeping");
            return Ok((Outcome::Kept, None));
        }

        // Parse before going to the network.
        let renderer = Renderer::embedded()?;

        let started = Instant::now();
        let resolution = tokio::time::timeout_at(deadline, resolver::resolve(source, &self.git_ref))
            .await
            .map_err(|_| ResolveError::Timeout(deadline.saturating_duration_since(started)))??;

        let text = renderer.render(&DescriptorData {
            git_ref: &self.git_ref,
            http_port: self.http_port,
            manage_port: self.manage_port,
            resolution: &resolution,
        })?;
        render::write_descriptor(&path, &text)?;

        debug!(path = %path.display(), "descriptor phase done");
        Ok((Outcome::Written, Some(resolution)))
    }
}
