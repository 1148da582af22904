//! # profile-versions (profv)
//!
//! **profv** keeps a profile directory under version control by shelling
//! out to `git`.
//!
//! Features:
//! - `profv snap` takes a snapshot now (initializing the repository on first use)
//! - `profv guard` versions the profile now, then snapshots again on Ctrl+C / SIGTERM
//! - `profv locate` prints the git executable that will be used
//! - `profv status` shows the profile, metadata dir and whether it is versioned
//! - `profv config` opens `config.toml` in `$EDITOR`
//! - `profv home` prints the profv home directory
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `warn`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use profile_versions::{
    Overrides, Report, cmd_config, cmd_guard, cmd_locate, cmd_snap, cmd_status, profv_home,
};
use tracing_subscriber::EnvFilter;

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "profv",
    version,
    about = "profile-versions (profv) - snapshot a profile directory with git",
    arg_required_else_help = true
)]
struct Cli {
    /// Profile directory to version (overrides `profile` in config.toml)
    #[arg(long, global = true, value_name = "DIR")]
    profile: Option<PathBuf>,
    /// Repository metadata directory (default: <profile>/.git)
    #[arg(long, global = true, value_name = "DIR")]
    git_dir: Option<PathBuf>,
    /// Report status through the log instead of the terminal
    #[arg(long, short, global = true)]
    quiet: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Snapshot the profile now
    Snap,
    /// Version the profile now, then snapshot it on Ctrl+C / SIGTERM
    Guard,
    /// Print the git executable that will be used
    Locate,
    /// Show the profile, metadata directory and versioning state
    Status,
    /// Open config.toml in $EDITOR
    Config,
    /// Show profv home directory
    Home,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_for(report: Report) -> ExitCode {
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// CLI entry point.
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let overrides = Overrides {
        profile: cli.profile,
        git_dir: cli.git_dir,
    };

    match cli.cmd {
        Cmd::Snap => cmd_snap(&overrides, cli.quiet).map(exit_for),
        Cmd::Guard => cmd_guard(&overrides, cli.quiet).map(exit_for),
        Cmd::Locate => cmd_locate(&overrides).map(|_| ExitCode::SUCCESS),
        Cmd::Status => cmd_status(&overrides).map(|_| ExitCode::SUCCESS),
        Cmd::Config => cmd_config().map(|_| ExitCode::SUCCESS),
        Cmd::Home => {
            println!("{}", profv_home()?.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
