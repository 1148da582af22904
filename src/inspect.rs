use anyhow::{Result, anyhow};
use colored::Colorize;

use crate::config::Overrides;
use crate::session::Failure;
use crate::snap::build_session;

/// CLI command: print the resolved path of the configured git executable.
///
/// # Errors
/// Fails with the user-facing "not found" message when no search path
/// directory holds the tool.
pub fn cmd_locate(overrides: &Overrides) -> Result<()> {
    let session = build_session(overrides, true)?;
    let tool = session
        .tool()
        .ok_or_else(|| anyhow!(Failure::ToolNotFound))?;
    println!("{}", tool.display());
    Ok(())
}

/// CLI command: show what a snapshot would act on.
///
/// Only runs the read-only repository check; nothing is staged or committed.
///
/// Example output:
/// ```text
/// tree root : /home/me/.mozilla/firefox/abcd.default
/// git dir   : /home/me/.mozilla/firefox/abcd.default/.git
/// git       : /usr/bin/git
/// versioned : yes
/// ```
pub fn cmd_status(overrides: &Overrides) -> Result<()> {
    let session = build_session(overrides, true)?;
    let cfg = session.config();
    println!("tree root : {}", cfg.tree_root.display());
    println!("git dir   : {}", cfg.git_dir.display());

    let Some(tool) = session.tool() else {
        println!("git       : {}", "not found".red());
        return Ok(());
    };
    println!("git       : {}", tool.display());

    let versioned = if session.is_repository(tool) {
        "yes".green()
    } else {
        "no".yellow()
    };
    println!("versioned : {}", versioned);
    Ok(())
}
