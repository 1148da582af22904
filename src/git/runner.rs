use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use thiserror::Error;
use tracing::debug;

/// Why an invocation produced no usable exit code.
#[derive(Debug, Error)]
pub enum RunError {
    /// The program is missing or is not an executable file. Nothing was spawned.
    #[error("executable not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The OS refused to start the process.
    #[error("failed to start {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The process ran but its exit status could not be determined.
    #[error("process failed: {} ({reason})", program.display())]
    ProcessFailed { program: PathBuf, reason: String },
}

/// Exit code of a finished process, or why there is none.
pub type ProcessResult = Result<i32, RunError>;

/// Completion handler for [`ProcessRunner::run_async`]. Invoked exactly once.
pub type Completion = Box<dyn FnOnce(ProcessResult) + Send + 'static>;

/// Runs one external process per call. Never retries.
pub trait ProcessRunner: Send + Sync {
    /// Spawn `program` and block until it exits.
    fn run(&self, program: &Path, args: &[OsString]) -> ProcessResult;

    /// Spawn `program` and return immediately; `done` receives the result.
    fn run_async(&self, program: &Path, args: &[OsString], done: Completion);
}

/// [`ProcessRunner`] backed by [`std::process::Command`].
///
/// Each async child is awaited on its own `git-wait` thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn spawn(&self, program: &Path, args: &[OsString]) -> Result<Child, RunError> {
        if !is_executable(program) {
            return Err(RunError::NotFound(program.to_path_buf()));
        }
        debug!(program = %program.display(), ?args, "spawning");
        Command::new(program)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: program.to_path_buf(),
                source,
            })
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> ProcessResult {
        let child = self.spawn(program, args)?;
        finish(program, child.wait_with_output())
    }

    fn run_async(&self, program: &Path, args: &[OsString], done: Completion) {
        let child = match self.spawn(program, args) {
            Ok(child) => child,
            Err(e) => return done(Err(e)),
        };
        let program = program.to_path_buf();
        let job = Arc::new(Mutex::new(Some((child, done))));
        let waiter = Arc::clone(&job);
        let waiter_program = program.clone();

        let spawned = thread::Builder::new()
            .name("git-wait".to_string())
            .spawn(move || {
                if let Some((child, done)) = take_job(&waiter) {
                    done(finish(&waiter_program, child.wait_with_output()));
                }
            });

        // No waiter thread: reap the child here so `done` still runs once.
        if let Err(e) = spawned
            && let Some((mut child, done)) = take_job(&job)
        {
            let _ = child.kill();
            let _ = child.wait();
            done(Err(RunError::ProcessFailed {
                program,
                reason: format!("cannot start waiter thread: {e}"),
            }));
        }
    }
}

type Job = Arc<Mutex<Option<(Child, Completion)>>>;

fn take_job(job: &Job) -> Option<(Child, Completion)> {
    match job.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

/// Turn a finished child into an exit code, logging whatever it printed.
fn finish(program: &Path, output: io::Result<Output>) -> ProcessResult {
    let output = output.map_err(|e| RunError::ProcessFailed {
        program: program.to_path_buf(),
        reason: e.to_string(),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        debug!(stdout = %stdout.trim(), "process output");
    }

    let code = output.status.code().ok_or_else(|| RunError::ProcessFailed {
        program: program.to_path_buf(),
        reason: format!("terminated without exit code ({})", output.status),
    })?;

    // Non-zero is not necessarily an error (rev-parse outside a repository);
    // the caller decides what deserves a warning.
    debug!(program = %program.display(), code, stderr = %stderr.trim(), "exited");
    Ok(code)
}

#[cfg(unix)]
fn is_executable(program: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    program
        .metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(program: &Path) -> bool {
    program.is_file()
}
