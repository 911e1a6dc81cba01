//! Command-line interface.

pub mod completions;
pub mod output;
pub mod start;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// OpenSlides - bootstrap and manage a deployment.
#[derive(Parser)]
#[command(
    name = "openslides",
    about = "Bootstrap and manage an OpenSlides deployment",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Resolve component versions, write the descriptor and create secrets
    Start(StartArgs),

    /// Show descriptor and secret store state
    Status {
        /// Deployment directory
        #[arg(long, env = "OPENSLIDES_DATA_DIR")]
        data_dir: Option<PathBuf>,
        /// Config file
        #[arg(long, env = "OPENSLIDES_CONFIG")]
        config: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Flags for `start`. Every flag overrides the config file.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Release ref of the meta repository (branch, tag or commit)
    #[arg(long = "ref", env = "OPENSLIDES_REF")]
    pub git_ref: Option<String>,

    /// Host port of the HTTP entry point
    #[arg(long, env = "OPENSLIDES_HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Host port of the management service
    #[arg(long, env = "OPENSLIDES_MANAGE_PORT")]
    pub manage_port: Option<u16>,

    /// Deadline for the whole run, in seconds
    #[arg(long = "timeout", env = "OPENSLIDES_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    /// Deployment directory
    #[arg(long, env = "OPENSLIDES_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the version source API
    #[arg(long, env = "OPENSLIDES_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Regenerate the descriptor and every secret
    #[arg(short, long)]
    pub force: bool,

    /// Config file
    #[arg(long, env = "OPENSLIDES_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    match command {
        Command::Start(args) => start::execute(args),
        Command::Status {
            data_dir,
            config,
            json,
        } => status::execute(data_dir, config, json),
        Command::Completions { shell } => completions::execute(shell),
    }
}
