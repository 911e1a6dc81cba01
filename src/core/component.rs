//! Upstream components and resolved revisions.
//!
//! The set of components is closed: adding one means adding a variant here
//! and a matching placeholder in the descriptor template.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::types::Revision;

/// An upstream repository pinned by the deployment descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Client,
    Backend,
    Datastore,
    Autoupdate,
    Auth,
    Media,
    Manage,
}

impl Component {
    /// Every component, in descriptor order.
    pub const ALL: [Component; 7] = [
        Component::Client,
        Component::Backend,
        Component::Datastore,
        Component::Autoupdate,
        Component::Auth,
        Component::Media,
        Component::Manage,
    ];

    /// Repository name as it appears in the meta repository listing.
    pub fn repository(self) -> &'static str {
        match self {
            Component::Client => "openslides-client",
            Component::Backend => "openslides-backend",
            Component::Datastore => "openslides-datastore-service",
            Component::Autoupdate => "openslides-autoupdate-service",
            Component::Auth => "openslides-auth-service",
            Component::Media => "openslides-media-service",
            Component::Manage => "openslides-manage-service",
        }
    }

    /// Placeholder name the descriptor template binds this revision to.
    pub fn template_key(self) -> &'static str {
        match self {
            Component::Client => "client",
            Component::Backend => "backend",
            Component::Datastore => "datastore",
            Component::Autoupdate => "autoupdate",
            Component::Auth => "auth",
            Component::Media => "media",
            Component::Manage => "manage",
        }
    }

    /// Look up a component by repository name.
    pub fn from_repository(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.repository() == name)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.repository())
    }
}

/// Revisions resolved for one release line.
///
/// May be partial; completeness is enforced by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    revisions: BTreeMap<Component, Revision>,
}

impl Resolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a revision, replacing any earlier one for the same component.
    pub fn insert(&mut self, component: Component, revision: impl Into<Revision>) {
        self.revisions.insert(component, revision.into());
    }

    pub fn get(&self, component: Component) -> Option<&str> {
        self.revisions.get(&component).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Components with no resolved revision.
    pub fn missing(&self) -> Vec<Component> {
        Component::ALL
            .into_iter()
            .filter(|c| !self.revisions.contains_key(c))
            .collect()
    }

    /// Revisions keyed by template key.
    pub fn by_template_key(&self) -> BTreeMap<&'static str, &str> {
        self.revisions
            .iter()
            .map(|(c, rev)| (c.template_key(), rev.as_str()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Component, &str)> {
        self.revisions.iter().map(|(c, rev)| (*c, rev.as_str()))
    }
}

impl FromIterator<(Component, Revision)> for Resolution {
    fn from_iter<I: IntoIterator<Item = (Component, Revision)>>(iter: I) -> Self {
        Self {
            revisions: iter.into_iter().collect(),
        }
    }
}
