use std::env::{self, consts::EXE_SUFFIX};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

/// Filesystem check used while scanning a search path.
///
/// The default [`FsProbe`] asks the real filesystem; tests substitute a spy
/// that records every candidate it was asked about.
pub trait Probe {
    fn is_file(&self, candidate: &Path) -> bool;
}

/// Probe backed by [`Path::is_file`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl Probe for FsProbe {
    fn is_file(&self, candidate: &Path) -> bool {
        candidate.is_file()
    }
}

/// Searches a platform path list (`$PATH`-style) for an executable.
#[derive(Debug, Default, Clone)]
pub struct ToolLocator<P = FsProbe> {
    probe: P,
}

impl ToolLocator<FsProbe> {
    pub fn new() -> Self {
        Self { probe: FsProbe }
    }
}

impl<P: Probe> ToolLocator<P> {
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// Return the first `<dir>/<name>` in `search_path` that is a file.
    ///
    /// - Directories are scanned in list order and the scan stops at the first hit.
    /// - `name` gets the platform executable suffix (`.exe` on Windows) unless it
    ///   already carries it.
    /// - Empty and relative entries are skipped, so a hit is always absolute.
    ///
    /// Returns `None` when no directory holds a match or the list is empty.
    pub fn locate(&self, name: &str, search_path: &OsStr) -> Option<PathBuf> {
        let file_name = executable_name(name);
        for dir in env::split_paths(search_path) {
            if dir.as_os_str().is_empty() || !dir.is_absolute() {
                trace!(dir = %dir.display(), "skipping search path entry");
                continue;
            }
            let candidate = dir.join(&file_name);
            if self.probe.is_file(&candidate) {
                debug!(path = %candidate.display(), "located executable");
                return Some(candidate);
            }
        }
        debug!(%file_name, "executable not found on search path");
        None
    }
}

/// Platform file name for an executable called `name`.
pub fn executable_name(name: &str) -> String {
    if EXE_SUFFIX.is_empty() || name.ends_with(EXE_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{EXE_SUFFIX}")
    }
}
