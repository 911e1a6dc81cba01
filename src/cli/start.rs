//! Start command - bootstrap a deployment directory.

use std::path::Path;

use tokio::time::Instant;
use tracing::debug;

use crate::cli::{output, StartArgs};
use crate::core::bootstrap::{Bootstrap, Outcome, Report};
use crate::core::config::{BootstrapConfig, Config, ExistingPolicy};
use crate::core::resolver::GithubSource;
use crate::error::{ResolveError, Result};

/// Run the bootstrap with config file values overridden by flags.
pub fn execute(args: StartArgs) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&args, &mut config.bootstrap);
    config.validate()?;

    let settings = &config.bootstrap;
    let run = Bootstrap::from_config(settings)?;
    let source = GithubSource::new(settings.source_url.clone())?;
    let timeout = settings.timeout();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    debug!(timeout = ?timeout, "starting runtime");
    let report = runtime.block_on(async {
        let deadline = Instant::now() + timeout;
        tokio::select! {
            result = run.run(&source, deadline) => result,
            _ = tokio::signal::ctrl_c() => Err(ResolveError::Cancelled.into()),
        }
    })?;

    print_report(run.layout().root(), &report);
    if let Some(notice) = kept_ref_notice(&report, args.git_ref.as_deref()) {
        output::warn(&notice);
    }
    Ok(())
}

/// Flags win over the file; environment values arrive through clap as flags.
fn apply_overrides(args: &StartArgs, config: &mut BootstrapConfig) {
    if let Some(git_ref) = &args.git_ref {
        config.git_ref = git_ref.clone();
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(port) = args.manage_port {
        config.manage_port = port;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(dir) = &args.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(url) = &args.source_url {
        config.source_url = url.clone();
    }
    if args.force {
        config.existing = ExistingPolicy::Overwrite;
    }
}

fn print_report(root: &Path, report: &Report) {
    output::success("deployment ready");
    output::kv("directory", output::path(root));
    output::kv("descriptor", report.descriptor);

    if let Some(resolution) = &report.resolution {
        output::section("Components");
        for (component, revision) in resolution.iter() {
            output::kv(component.template_key(), short_revision(revision));
        }
    }

    output::section("Secrets");
    for (name, outcome) in &report.secrets {
        output::kv(name.file_name(), outcome);
    }

    if report.descriptor == Outcome::Kept {
        println!();
        output::dimmed("existing descriptor kept, use --force to regenerate");
    }
}

/// A ref passed for this run has no effect on a kept descriptor.
fn kept_ref_notice(report: &Report, git_ref: Option<&str>) -> Option<String> {
    match (report.descriptor, git_ref) {
        (Outcome::Kept, Some(git_ref)) => Some(format!(
            "--ref {} not applied, the descriptor keeps its pinned revisions; use --force to re-pin",
            git_ref
        )),
        _ => None,
    }
}

fn short_revision(revision: &str) -> &str {
    revision.get(..12).unwrap_or(revision)
}
