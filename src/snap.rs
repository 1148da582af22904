use anyhow::Result;
use tracing::info;

use crate::config::{Overrides, load_config};
use crate::git::SystemRunner;
use crate::notify::{ConsoleNotifier, Notifier, TracingNotifier};
use crate::session::{Report, RepositorySession};
use crate::trigger::{Trigger, wait_for_quit};

/// Session wired to the real `git` binary.
pub type SystemSession = RepositorySession<SystemRunner, Box<dyn Notifier>>;

/// Build a session from `config.toml` plus command-line overrides.
///
/// With `quiet`, statuses go to the log instead of the terminal.
pub fn build_session(overrides: &Overrides, quiet: bool) -> Result<SystemSession> {
    let config = load_config()?.resolve(overrides)?;
    let notifier: Box<dyn Notifier> = if quiet {
        Box::new(TracingNotifier)
    } else {
        Box::new(ConsoleNotifier::new())
    };
    info!(
        tree = %config.tree_root.display(),
        git_dir = %config.git_dir.display(),
        "session configured"
    );
    Ok(RepositorySession::new(config, SystemRunner::new(), notifier))
}

/// CLI command: take one snapshot now.
pub fn cmd_snap(overrides: &Overrides, quiet: bool) -> Result<Report> {
    let trigger = Trigger::new(build_session(overrides, quiet)?);
    Ok(trigger.fire().unwrap_or_default())
}

/// CLI command: version the tree now, then snapshot again on Ctrl+C / SIGTERM.
///
/// The tool check, repository check and any bootstrap run before waiting, so
/// a missing `git` or a failed `init` is reported immediately and the quit
/// path only has to `add` and `commit`.
pub fn cmd_guard(overrides: &Overrides, quiet: bool) -> Result<Report> {
    let trigger = Trigger::new(build_session(overrides, quiet)?);
    trigger.guard(|| {
        eprintln!("waiting for quit signal (Ctrl+C) to snapshot the profile…");
        wait_for_quit()
    })
}
