//! The snapshot state machine.
//!
//! One call to [`RepositorySession::request_snapshot`] walks:
//!
//! ```text
//! Idle → ToolCheck → RepoCheck ─┬─ BootstrapInit → BootstrapAdd → BootstrapCommit ─┐
//!                               └─ Add → Commit ───────────────────────────────────┴─ Done
//! ```
//!
//! Every failure is terminal for the cycle and reported once; a later
//! request starts over from `ToolCheck`.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, mpsc};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::git::{
    FsProbe, GitIndex, GitOp, Probe, ProcessResult, ProcessRunner, RunError, ToolLocator,
};
use crate::notify::{Notifier, Status, StatusKind};

/// Default notification title.
pub const DEFAULT_TITLE: &str = "Profile Versions";

const INITIALIZING: &str = "Initializing profile versions (takes time)";

/// Fixed configuration for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory whose contents are snapshotted (`--work-tree`).
    pub tree_root: PathBuf,
    /// Repository metadata directory (`--git-dir`).
    pub git_dir: PathBuf,
    /// Executable name looked up on `search_path`.
    pub tool_name: String,
    /// Platform path list, `$PATH` by default.
    pub search_path: OsString,
    pub title: String,
}

impl SessionConfig {
    /// Defaults for `tree_root`: `<tree_root>/.git`, `git` from `$PATH`.
    pub fn new(tree_root: impl Into<PathBuf>) -> Self {
        let tree_root = tree_root.into();
        Self {
            git_dir: tree_root.join(".git"),
            tree_root,
            tool_name: "git".to_string(),
            search_path: env::var_os("PATH").unwrap_or_default(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Why a snapshot cycle stopped. `Display` is the user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("Git installation was not found on system")]
    ToolNotFound,
    #[error("Unable to initialize git repository")]
    InitFailed,
    #[error("Unable to stage profile to git repository")]
    StageFailed,
    #[error("Unable to version profile")]
    CommitFailed,
    #[error("Failed to version profile")]
    SnapshotFailed,
}

/// Terminal state of one pass through the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Bootstrap chain completed on a fresh tree.
    Initialized,
    /// A version was committed to an existing repository.
    Created,
    Failed(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }

    pub fn text(&self) -> String {
        match self {
            Outcome::Initialized => "Profile versions initialized!".to_string(),
            Outcome::Created => "Version created".to_string(),
            Outcome::Failed(f) => f.to_string(),
        }
    }
}

/// Outcomes reached during one request, in order.
///
/// Holds two entries when a bootstrap was followed by its re-entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    /// True when any pass established or advanced versioning.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().any(Outcome::is_success)
    }

    pub fn last(&self) -> Option<&Outcome> {
        self.outcomes.last()
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    ToolCheck,
    RepoCheck,
    BootstrapInit,
    BootstrapAdd,
    BootstrapCommit,
    Add,
    Commit,
    Done,
}

/// Sequences repository checks and snapshot steps over a [`ProcessRunner`].
///
/// Not safe to drive concurrently against one repository; callers serialize
/// requests (see [`crate::trigger::Trigger`]).
pub struct RepositorySession<R, N, P = FsProbe> {
    config: SessionConfig,
    index: GitIndex,
    locator: ToolLocator<P>,
    tool: OnceLock<Option<PathBuf>>,
    runner: R,
    notifier: N,
    clock: fn() -> String,
}

impl<R: ProcessRunner, N: Notifier> RepositorySession<R, N, FsProbe> {
    pub fn new(config: SessionConfig, runner: R, notifier: N) -> Self {
        Self {
            index: GitIndex::new(&config.git_dir, &config.tree_root),
            config,
            locator: ToolLocator::new(),
            tool: OnceLock::new(),
            runner,
            notifier,
            clock: timestamp,
        }
    }
}

impl<R: ProcessRunner, N: Notifier, P: Probe> RepositorySession<R, N, P> {
    /// Swap the tool locator (and its filesystem probe).
    pub fn with_locator<Q: Probe>(self, locator: ToolLocator<Q>) -> RepositorySession<R, N, Q> {
        RepositorySession {
            config: self.config,
            index: self.index,
            locator,
            tool: OnceLock::new(),
            runner: self.runner,
            notifier: self.notifier,
            clock: self.clock,
        }
    }

    /// Override the commit message source.
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolved tool path. Searched once, then cached for the session's lifetime.
    pub fn tool(&self) -> Option<&Path> {
        self.tool
            .get_or_init(|| {
                self.locator
                    .locate(&self.config.tool_name, &self.config.search_path)
            })
            .as_deref()
    }

    /// Whether the fixed tree/metadata pair is already a repository.
    ///
    /// Runs `rev-parse --is-inside-work-tree` blocking; only exit code 0 counts.
    pub fn is_repository(&self, tool: &Path) -> bool {
        matches!(self.run(tool, &GitOp::IsInsideWorkTree), Ok(0))
    }

    /// Run one snapshot cycle and report its outcome.
    ///
    /// A successful bootstrap re-enters the cycle once, so a fresh tree gets
    /// its first regular snapshot on the same request.
    pub fn request_snapshot(&self) -> Report {
        let mut report = Report::default();
        let mut outcome = self.snapshot_once();
        report.outcomes.push(outcome);
        if outcome == Outcome::Initialized {
            debug!("re-entering after bootstrap");
            outcome = self.snapshot_once();
            report.outcomes.push(outcome);
        }
        report
    }

    /// Make sure the tree is versioned without taking a snapshot.
    ///
    /// Runs the tool and repository checks and, on an unversioned tree, the
    /// bootstrap chain. Returns `None` when the repository already exists
    /// (nothing is reported); otherwise the reported outcome.
    pub fn prepare(&self) -> Option<Outcome> {
        self.enter(State::ToolCheck);
        let Some(tool) = self.tool() else {
            return Some(self.done(Outcome::Failed(Failure::ToolNotFound)));
        };

        self.enter(State::RepoCheck);
        if self.is_repository(tool) {
            debug!("repository present");
            return None;
        }
        Some(self.done(self.bootstrap(tool)))
    }

    fn snapshot_once(&self) -> Outcome {
        self.enter(State::ToolCheck);
        let Some(tool) = self.tool() else {
            return self.done(Outcome::Failed(Failure::ToolNotFound));
        };

        self.enter(State::RepoCheck);
        let outcome = if self.is_repository(tool) {
            self.direct(tool)
        } else {
            self.bootstrap(tool)
        };
        self.done(outcome)
    }

    /// init → add → commit, each awaited and gated on the previous exit code.
    fn bootstrap(&self, tool: &Path) -> Outcome {
        self.notify(INITIALIZING, StatusKind::Advisory);

        self.enter(State::BootstrapInit);
        if !succeeded(self.run_awaited(tool, &GitOp::Init)) {
            return Outcome::Failed(Failure::InitFailed);
        }
        self.enter(State::BootstrapAdd);
        if !succeeded(self.run_awaited(tool, &GitOp::AddAll)) {
            return Outcome::Failed(Failure::StageFailed);
        }
        self.enter(State::BootstrapCommit);
        if !succeeded(self.run_awaited(tool, &self.commit_op())) {
            return Outcome::Failed(Failure::CommitFailed);
        }
        Outcome::Initialized
    }

    /// add → commit on an existing repository, both blocking.
    fn direct(&self, tool: &Path) -> Outcome {
        self.enter(State::Add);
        if !succeeded(self.run(tool, &GitOp::AddAll)) {
            return Outcome::Failed(Failure::SnapshotFailed);
        }
        self.enter(State::Commit);
        if !succeeded(self.run(tool, &self.commit_op())) {
            return Outcome::Failed(Failure::SnapshotFailed);
        }
        Outcome::Created
    }

    fn commit_op(&self) -> GitOp {
        GitOp::Commit((self.clock)())
    }

    fn run(&self, tool: &Path, op: &GitOp) -> ProcessResult {
        self.runner.run(tool, &self.index.args(op))
    }

    /// Start `op` asynchronously and wait for its completion before returning.
    fn run_awaited(&self, tool: &Path, op: &GitOp) -> ProcessResult {
        let (tx, rx) = mpsc::channel();
        self.runner.run_async(
            tool,
            &self.index.args(op),
            Box::new(move |res| {
                let _ = tx.send(res);
            }),
        );
        rx.recv().unwrap_or_else(|_| {
            Err(RunError::ProcessFailed {
                program: tool.to_path_buf(),
                reason: format!("{} completion was dropped", op.name()),
            })
        })
    }

    fn enter(&self, state: State) {
        debug!(?state, tree = %self.config.tree_root.display(), "snapshot state");
    }

    fn done(&self, outcome: Outcome) -> Outcome {
        self.enter(State::Done);
        match outcome {
            Outcome::Failed(reason) => warn!(?reason, "snapshot failed"),
            _ => info!(?outcome, "snapshot finished"),
        }
        let kind = if outcome.is_success() {
            StatusKind::Success
        } else {
            StatusKind::Failure
        };
        self.notify(&outcome.text(), kind);
        outcome
    }

    fn notify(&self, text: &str, kind: StatusKind) {
        self.notifier
            .report_status(&Status::new(&self.config.title, text, kind));
    }
}

/// Spawn errors and non-zero exits both count as a failed step.
fn succeeded(res: ProcessResult) -> bool {
    match res {
        Ok(0) => true,
        Ok(code) => {
            debug!(code, "step exited non-zero");
            false
        }
        Err(e) => {
            warn!(error = %e, "step could not run");
            false
        }
    }
}

/// Commit message for a snapshot, e.g. `Mon Oct 19 2026 14:03:11 GMT+0200`.
pub fn timestamp() -> String {
    chrono::Local::now()
        .format("%a %b %d %Y %H:%M:%S GMT%z")
        .to_string()
}
