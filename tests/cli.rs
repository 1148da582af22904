//! Runs the `profv` binary with captured (non-terminal) stderr.

use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::{TempDir, tempdir};

/// A config home whose `config.toml` restricts the git search path to `search_path`.
fn config_home(search_path: &str) -> TempDir {
    let home = tempdir().unwrap();
    let dir = home.path().join("profile-versions");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("config.toml"),
        format!("search_path = '{search_path}'\n"),
    )
    .unwrap();
    home
}

fn profv(xdg: &Path, profile: &Path, cmd: &str) -> Command {
    let mut c = Command::new(env!("CARGO_BIN_EXE_profv"));
    c.arg(cmd)
        .arg("--profile")
        .arg(profile)
        .env("XDG_CONFIG_HOME", xdg)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    c
}

/// Wait for `cmd` to exit on its own, killing it after `limit`.
fn run_within(mut cmd: Command, limit: Duration) -> Output {
    let mut child = cmd.spawn().unwrap();
    let started = Instant::now();
    while child.try_wait().unwrap().is_none() {
        if started.elapsed() > limit {
            child.kill().unwrap();
            panic!("profv did not exit within {limit:?}");
        }
        thread::sleep(Duration::from_millis(20));
    }
    child.wait_with_output().unwrap()
}

#[test]
fn snap_prints_status_when_stderr_is_not_a_terminal() {
    let empty_bin = tempdir().unwrap();
    let xdg = config_home(&empty_bin.path().display().to_string());
    let profile = tempdir().unwrap();

    let out = profv(xdg.path(), profile.path(), "snap").output().unwrap();

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!out.status.success());
    assert!(
        stderr.contains("✘ Profile Versions Git installation was not found on system"),
        "stderr was: {stderr}"
    );
}

#[test]
fn guard_reports_missing_git_without_waiting_for_quit() {
    let empty_bin = tempdir().unwrap();
    let xdg = config_home(&empty_bin.path().display().to_string());
    let profile = tempdir().unwrap();

    let out = run_within(
        profv(xdg.path(), profile.path(), "guard"),
        Duration::from_secs(30),
    );

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!out.status.success());
    assert!(stderr.contains("Git installation was not found on system"), "stderr was: {stderr}");
    assert!(!stderr.contains("waiting for quit signal"), "stderr was: {stderr}");
}

#[cfg(unix)]
#[test]
fn snap_prints_bootstrap_progress_with_real_git() {
    let Some(path) = std::env::var_os("PATH") else {
        return;
    };
    let path = path.to_string_lossy().into_owned();
    if !path.split(':').any(|d| Path::new(d).join("git").is_file()) {
        eprintln!("git not found on PATH; skipping");
        return;
    }
    let xdg = config_home(&path);
    let profile = tempdir().unwrap();
    fs::write(profile.path().join("prefs.js"), "user_pref(\"a\", 1);\n").unwrap();
    let gitconfig = xdg.path().join("gitconfig");
    fs::write(&gitconfig, "").unwrap();

    let mut cmd = profv(xdg.path(), profile.path(), "snap");
    cmd.env("GIT_CONFIG_GLOBAL", &gitconfig)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_NAME", "profv")
        .env("GIT_AUTHOR_EMAIL", "profv@example.invalid")
        .env("GIT_COMMITTER_NAME", "profv")
        .env("GIT_COMMITTER_EMAIL", "profv@example.invalid");
    let out = cmd.output().unwrap();

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "stderr was: {stderr}");
    assert!(stderr.contains("Initializing profile versions"), "stderr was: {stderr}");
    assert!(stderr.contains("Profile versions initialized!"), "stderr was: {stderr}");
}
