//! Version resolution.
//!
//! Asks a [`VersionSource`] for the components pinned at a release line and
//! keeps the revisions of the components this tool knows about.
//!
//! ## Adding a New Source
//!
//! 1. Implement the `VersionSource` trait
//! 2. Pass it to [`resolve`] or to the bootstrap orchestrator

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Request;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::core::component::{Component, Resolution};
use crate::core::constants;
use crate::core::types::Revision;
use crate::error::ResolveError;

/// One entry of a component listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComponentEntry {
    pub name: String,
    pub sha: Revision,
}

impl ComponentEntry {
    pub fn new(name: impl Into<String>, sha: impl Into<Revision>) -> Self {
        Self {
            name: name.into(),
            sha: sha.into(),
        }
    }
}

/// External source of truth for component revisions.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// List `(name, revision)` entries at `git_ref`.
    ///
    /// Performs exactly one request; no retries.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` on transport failure, a non-success status,
    /// or a body that is not a listing.
    async fn list(&self, git_ref: &str) -> Result<Vec<ComponentEntry>, ResolveError>;
}

/// Resolve the revision of every known component at `git_ref`.
///
/// Unknown entries are skipped. Missing components are not an error here;
/// the result may be partial.
///
/// # Errors
///
/// Returns `ResolveError::EmptyRef` for an empty ref and
/// `ResolveError::InvalidRevision` if a known component is not pinned to a
/// hex commit id, otherwise whatever the source reports.
pub async fn resolve<S>(source: &S, git_ref: &str) -> Result<Resolution, ResolveError>
where
    S: VersionSource + ?Sized,
{
    if git_ref.trim().is_empty() {
        return Err(ResolveError::EmptyRef);
    }

    debug!(git_ref, "resolving component versions");
    let entries = source.list(git_ref).await?;

    let mut resolution = Resolution::new();
    for entry in entries {
        match Component::from_repository(&entry.name) {
            Some(component) => {
                if !is_commit_id(&entry.sha) {
                    return Err(ResolveError::InvalidRevision {
                        name: entry.name,
                        revision: entry.sha,
                    });
                }
                trace!(component = %component, sha = %entry.sha, "resolved");
                resolution.insert(component, entry.sha);
            }
            None => trace!(name = %entry.name, "ignoring unknown listing entry"),
        }
    }

    debug!(
        resolved = resolution.len(),
        missing = resolution.missing().len(),
        "resolution finished"
    );
    Ok(resolution)
}

/// Lowercase hex, abbreviated (7) up to SHA-256 length (64).
fn is_commit_id(revision: &str) -> bool {
    (7..=64).contains(&revision.len())
        && revision
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Parse a JSON component listing.
///
/// # Errors
///
/// Returns `ResolveError::Malformed` if the body is not an array of
/// `{name, sha}` objects.
pub fn parse_listing(body: &str) -> Result<Vec<ComponentEntry>, ResolveError> {
    serde_json::from_str(body).map_err(ResolveError::Malformed)
}

/// Version source backed by the GitHub contents API of the meta repository.
///
/// Submodules in the listing carry the pinned commit as `sha`.
pub struct GithubSource {
    client: reqwest::Client,
    base_url: String,
}

impl GithubSource {
    /// Create a source against `base_url` (e.g. `https://api.github.com`).
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(ResolveError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Listing request for `git_ref`. The ref is form-encoded as a single
    /// query value.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Transport` if the base URL is not a valid URL.
    pub fn listing_request(&self, git_ref: &str) -> Result<Request, ResolveError> {
        self.client
            .get(format!("{}/repos/{}/contents", self.base_url, constants::META_REPOSITORY))
            .query(&[("ref", git_ref)])
            .header(USER_AGENT, concat!("openslides-manage/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json")
            .build()
            .map_err(ResolveError::Transport)
    }
}

#[async_trait]
impl VersionSource for GithubSource {
    async fn list(&self, git_ref: &str) -> Result<Vec<ComponentEntry>, ResolveError> {
        let request = self.listing_request(git_ref)?;
        debug!(url = %request.url(), "fetching component listing");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(ResolveError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                status: status.as_u16(),
                git_ref: git_ref.to_string(),
            });
        }

        let body = response.text().await.map_err(ResolveError::Transport)?;
        trace!(body_len = body.len(), "listing received");

        parse_listing(&body)
    }
}
