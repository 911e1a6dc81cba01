//! Descriptor rendering.
//!
//! Renders the deployment descriptor from the embedded template with tera.
//! Rendering is strict: every placeholder must have a value, and every
//! component must have a resolved revision. Output is written atomically.

use std::io::Write;
use std::path::Path;

use tera::{Context, Tera};
use tracing::debug;

use crate::core::component::Resolution;
use crate::error::RenderError;

/// Name the embedded descriptor template is registered under.
pub const TEMPLATE_NAME: &str = "docker-compose.yml";

const EMBEDDED_TEMPLATE: &str = include_str!("../../templates/docker-compose.yml.tera");

/// Values substituted into the descriptor template.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorData<'a> {
    pub git_ref: &'a str,
    pub http_port: u16,
    pub manage_port: u16,
    pub resolution: &'a Resolution,
}

impl DescriptorData<'_> {
    fn context(&self) -> Context {
        let mut context = Context::new();
        context.insert("git_ref", self.git_ref);
        context.insert("external_http_port", &self.http_port);
        context.insert("external_manage_port", &self.manage_port);
        for (key, revision) in self.resolution.by_template_key() {
            context.insert(key, revision);
        }
        context
    }
}

/// Descriptor template renderer.
pub struct Renderer {
    tera: Tera,
    name: String,
}

impl Renderer {
    /// Renderer for the template shipped with this binary.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Parse` if the embedded template is malformed.
    pub fn embedded() -> Result<Self, RenderError> {
        Self::from_source(TEMPLATE_NAME, EMBEDDED_TEMPLATE)
    }

    /// Renderer for an arbitrary template source.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Parse` if the template does not parse.
    pub fn from_source(name: &str, source: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(name, source)
            .map_err(|e| RenderError::Parse {
                name: name.to_string(),
                reason: describe(&e),
            })?;

        debug!(template = name, "template loaded");
        Ok(Self {
            tera,
            name: name.to_string(),
        })
    }

    /// Render the descriptor text.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::MissingRevision` if any component is unresolved,
    /// or `RenderError::Evaluate` if the template references a value that
    /// is not in the data set.
    pub fn render(&self, data: &DescriptorData<'_>) -> Result<String, RenderError> {
        if let Some(component) = data.resolution.missing().into_iter().next() {
            return Err(RenderError::MissingRevision { component });
        }

        let rendered = self
            .tera
            .render(&self.name, &data.context())
            .map_err(|e| RenderError::Evaluate {
                name: self.name.clone(),
                reason: describe(&e),
            })?;

        debug!(bytes = rendered.len(), "descriptor rendered");
        Ok(rendered)
    }
}

/// Write the descriptor to `path`, replacing any previous file.
///
/// The content goes to a temporary file in the same directory which is then
/// renamed over `path`, so readers see either the old or the new file.
///
/// # Errors
///
/// Returns `RenderError::Write` if any filesystem step fails.
pub fn write_descriptor(path: &Path, contents: &str) -> Result<(), RenderError> {
    let write_err = |source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(contents.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    // NamedTempFile is created 0600; the descriptor is not secret.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    temp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), "descriptor written");
    Ok(())
}

/// Flatten a tera error and its causes into one line.
fn describe(err: &tera::Error) -> String {
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}
