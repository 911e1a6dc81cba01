//! Status command - show what a deployment directory holds.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::cli::output;
use crate::core::bootstrap::Layout;
use crate::core::config::Config;
use crate::core::secrets::{self, SecretState};
use crate::error::Result;

/// Show descriptor and secret store state.
pub fn execute(data_dir: Option<PathBuf>, config: Option<PathBuf>, json: bool) -> Result<()> {
    let root = match data_dir {
        Some(dir) => dir,
        None => Config::load(config.as_deref())?.bootstrap.data_dir()?,
    };
    let layout = Layout::new(root);

    let descriptor = layout.descriptor_path().is_file();
    let modified = modified(&layout.descriptor_path());
    let secrets = secrets::inspect(&layout.secrets_dir());
    let ready = descriptor && secrets.iter().all(|(_, s)| *s == SecretState::Present);

    if json {
        let secrets: serde_json::Map<String, serde_json::Value> = secrets
            .iter()
            .map(|(name, state)| (name.file_name().to_string(), state_label(*state).into()))
            .collect();
        let result = serde_json::json!({
            "directory": layout.root().display().to_string(),
            "descriptor": descriptor,
            "descriptor_modified": modified.map(|t| t.to_rfc3339()),
            "secrets": secrets,
            "ready": ready,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::kv("directory", output::path(layout.root()));
    match (descriptor, modified) {
        (true, Some(t)) => output::kv(
            "descriptor",
            format!("present (written {})", t.format("%Y-%m-%d %H:%M")),
        ),
        (true, None) => output::kv("descriptor", "present"),
        (false, _) => output::kv("descriptor", "missing"),
    }
    for (name, state) in &secrets {
        output::kv(name.file_name(), state_label(*state));
    }

    if ready {
        output::success("ready");
    } else {
        output::warn("not bootstrapped, run: openslides start");
    }

    Ok(())
}

fn state_label(state: SecretState) -> String {
    match state {
        SecretState::Present => "present".to_string(),
        SecretState::Missing => "missing".to_string(),
        SecretState::InvalidLength(len) => format!("invalid ({} bytes)", len),
    }
}

fn modified(path: &Path) -> Option<DateTime<Local>> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Local>::from)
}
