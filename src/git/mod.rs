//! Git integration layer.
//!
//! Everything here talks to an installed `git` binary through subprocesses;
//! nothing reads or writes the repository directly.
//!
//! - [`locate`] finds the executable on a search path.
//! - [`runner`] spawns it, blocking or with a completion callback.
//! - [`command`] builds the argument vectors, all bound to one
//!   `--git-dir` / `--work-tree` pair.

mod command;
mod locate;
mod runner;

pub use command::{GitIndex, GitOp};
pub use locate::{FsProbe, Probe, ToolLocator, executable_name};
pub use runner::{Completion, ProcessResult, ProcessRunner, RunError, SystemRunner};
