use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::paths::paths;
use crate::session::{DEFAULT_TITLE, SessionConfig};

/// Settings loaded from `config.toml`.
///
/// Every key is optional; command-line flags take precedence.
///
/// Example TOML:
/// ```toml
/// profile     = "/home/me/.mozilla/firefox/abcd.default"
/// git_dir     = "/home/me/.mozilla/firefox/abcd.default/.git"
/// tool        = "git"
/// search_path = "/usr/local/bin:/usr/bin"
/// title       = "Profile Versions"
/// ```
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub profile: Option<PathBuf>,
    #[serde(default)]
    pub git_dir: Option<PathBuf>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub search_path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Values given on the command line. They override [`Config`].
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub profile: Option<PathBuf>,
    pub git_dir: Option<PathBuf>,
}

/// Load and parse `config.toml`.
///
/// A missing file yields the defaults.
///
/// # Errors
/// - The file exists but cannot be read.
/// - The file is not valid TOML or has unknown keys.
pub fn load_config() -> Result<Config> {
    let p = paths()?;
    load_config_from(&p.config)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let txt = match fs::read_to_string(path) {
        Ok(txt) => txt,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    toml::from_str(&txt).with_context(|| format!("failed to parse {}", path.display()))
}

impl Config {
    /// Build the session configuration, applying `overrides` on top.
    ///
    /// # Errors
    /// - No profile directory is configured anywhere.
    /// - The profile directory does not exist.
    pub fn resolve(&self, overrides: &Overrides) -> Result<SessionConfig> {
        let Some(tree_root) = overrides.profile.clone().or_else(|| self.profile.clone()) else {
            bail!("no profile directory configured (use --profile or set `profile` in config.toml)");
        };
        if !tree_root.is_dir() {
            bail!("profile directory not found: {}", tree_root.display());
        }

        let mut cfg = SessionConfig::new(tree_root);
        if let Some(git_dir) = overrides.git_dir.clone().or_else(|| self.git_dir.clone()) {
            cfg.git_dir = git_dir;
        }
        if let Some(tool) = &self.tool {
            cfg.tool_name = tool.clone();
        }
        if let Some(search_path) = &self.search_path {
            cfg.search_path = OsString::from(search_path);
        }
        cfg.title = self.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string());
        Ok(cfg)
    }
}

/// CLI command: open `config.toml` in `$EDITOR` (default `vim`).
///
/// Creates the config directory first so the editor can save a new file.
pub fn cmd_config() -> Result<()> {
    let p = paths()?;
    fs::create_dir_all(&p.home)
        .with_context(|| format!("failed to create {}", p.home.display()))?;

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
    let mut cmd = Command::new(&editor);
    cmd.arg(&p.config);

    // vim: no swap file
    let is_vim = Path::new(&editor)
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase().contains("vim"))
        .unwrap_or(false);
    if is_vim {
        cmd.arg("-n");
    }

    let status = cmd
        .status()
        .with_context(|| format!("failed to launch editor: {}", editor))?;
    if !status.success() {
        bail!("editor exited with {}", status);
    }
    Ok(())
}
