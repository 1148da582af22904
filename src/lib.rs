//! Crate entry point for **profile-versions (profv)**.
//!
//! This library snapshots a profile directory into a git repository by
//! driving an installed `git` binary. Each submodule encapsulates one
//! responsibility (locating and running git, sequencing a snapshot,
//! reporting status, configuration). The `pub use` re-exports make the
//! commands and core types reachable from the crate root.

mod config;
pub mod git;
mod inspect;
pub mod notify;
mod paths;
pub mod session;
mod snap;
pub mod trigger;

pub use config::{Config, Overrides, cmd_config, load_config};
pub use inspect::{cmd_locate, cmd_status};
pub use paths::profv_home;
pub use session::{Failure, Outcome, Report, RepositorySession, SessionConfig};
pub use snap::{SystemSession, build_session, cmd_guard, cmd_snap};
