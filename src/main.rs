//! OpenSlides - bootstrap and manage a deployment.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use openslides_manage::cli::output;
use openslides_manage::cli::{execute, Cli};
use openslides_manage::error::{ConfigError, Error, RenderError, ResolveError, SecretError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("OPENSLIDES_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("openslides_manage=debug")
        } else {
            EnvFilter::new("openslides_manage=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .init();

    if let Err(e) = execute(cli.command) {
        output::error(&e.to_string());
        if let Some(hint) = hint(&e) {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}

fn hint(e: &Error) -> Option<&'static str> {
    match e {
        Error::Config(ConfigError::Parse(_)) => Some("check the [bootstrap] table of manage.toml"),
        Error::Config(ConfigError::NoDirectory(_)) => Some("pass --data-dir"),
        Error::Resolve(ResolveError::Status { status: 404, .. }) => {
            Some("check that --ref names an existing branch, tag or commit")
        }
        Error::Resolve(ResolveError::Timeout(_)) => Some("raise --timeout"),
        Error::Render(RenderError::MissingRevision { .. }) => {
            Some("the ref does not pin every service; pick a newer release ref")
        }
        Error::Resolve(ResolveError::InvalidRevision { .. }) => {
            Some("the version source returned an unexpected listing; check --source-url")
        }
        Error::Secret(SecretError::Corrupt { .. }) => {
            Some("rerun with --force to regenerate the descriptor and every secret")
        }
        Error::Secret(SecretError::CreateDir { .. } | SecretError::Write { .. }) => {
            Some("check permissions of the deployment directory")
        }
        _ => None,
    }
}
