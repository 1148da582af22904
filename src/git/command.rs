use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The `--git-dir` / `--work-tree` pair every invocation is bound to.
///
/// Both paths are fixed when the session is built, so every operation
/// acts on the same versioned tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIndex {
    git_dir: PathBuf,
    work_tree: PathBuf,
}

/// One git operation issued by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOp {
    /// `rev-parse --is-inside-work-tree`
    IsInsideWorkTree,
    /// `init`
    Init,
    /// `add .`
    AddAll,
    /// `commit -m <message>`
    Commit(String),
}

impl GitOp {
    pub fn name(&self) -> &'static str {
        match self {
            GitOp::IsInsideWorkTree => "rev-parse",
            GitOp::Init => "init",
            GitOp::AddAll => "add",
            GitOp::Commit(_) => "commit",
        }
    }

    fn tail(&self) -> Vec<OsString> {
        match self {
            GitOp::IsInsideWorkTree => vec!["rev-parse".into(), "--is-inside-work-tree".into()],
            GitOp::Init => vec!["init".into()],
            GitOp::AddAll => vec!["add".into(), ".".into()],
            GitOp::Commit(message) => vec!["commit".into(), "-m".into(), message.into()],
        }
    }
}

impl GitIndex {
    pub fn new(git_dir: impl Into<PathBuf>, work_tree: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
            work_tree: work_tree.into(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Full argument vector for `op`: the fixed prefix followed by the operation.
    pub fn args(&self, op: &GitOp) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--git-dir".into(),
            self.git_dir.clone().into(),
            "--work-tree".into(),
            self.work_tree.clone().into(),
        ];
        args.extend(op.tail());
        args
    }
}
