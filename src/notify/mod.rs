//! Status reporting.
//!
//! A snapshot hands every outcome to a [`Notifier`] as a title and a short,
//! non-technical text. Exit codes and git output never reach it; those go to
//! the `tracing` log instead.

mod progress;

use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::Duration;

use colored::Colorize;
use indicatif::ProgressBar;
use tracing::{info, warn};

use progress::{err_style, ok_style, spinner_style};

/// What kind of message a [`Status`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Work has started and will take a while.
    Advisory,
    Success,
    Failure,
}

/// One user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub title: String,
    pub text: String,
    pub kind: StatusKind,
}

impl Status {
    pub fn new(title: impl Into<String>, text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            kind,
        }
    }
}

/// Receives status messages. Fire-and-forget: implementations must not fail.
pub trait Notifier: Send + Sync {
    fn report_status(&self, status: &Status);
}

/// Terminal notifier.
///
/// An advisory starts a spinner; the next terminal status finishes it with a
/// ✔ or ✘. Without a running spinner a single ✔/✘ line is printed.
///
/// When stderr is not a terminal (pipes, cron, systemd) spinners would be
/// hidden, so every status is written as a plain line instead.
pub struct ConsoleNotifier {
    active: Mutex<Option<ProgressBar>>,
    interactive: bool,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::with_interactive(std::io::stderr().is_terminal())
    }
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force spinner (`true`) or plain-line (`false`) output.
    pub fn with_interactive(interactive: bool) -> Self {
        Self {
            active: Mutex::new(None),
            interactive,
        }
    }
}

/// Uncolored one-line rendering of `status`, e.g. `✔ Profile Versions Version created`.
pub fn plain_line(status: &Status) -> String {
    let mark = match status.kind {
        StatusKind::Advisory => "…",
        StatusKind::Success => "✔",
        StatusKind::Failure => "✘",
    };
    format!("{} {} {}", mark, status.title, status.text)
}

impl Notifier for ConsoleNotifier {
    fn report_status(&self, status: &Status) {
        if !self.interactive {
            eprintln!("{}", plain_line(status));
            return;
        }

        let msg = format!("{} {}", status.title.bold(), status.text);
        let mut active = match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match status.kind {
            StatusKind::Advisory => {
                if let Some(prev) = active.take() {
                    prev.finish_and_clear();
                }
                let pb = ProgressBar::new_spinner();
                pb.set_style(spinner_style());
                pb.set_message(msg);
                pb.enable_steady_tick(Duration::from_millis(80));
                *active = Some(pb);
            }
            StatusKind::Success | StatusKind::Failure => {
                let pb = active.take().unwrap_or_else(ProgressBar::new_spinner);
                pb.set_style(if status.kind == StatusKind::Success {
                    ok_style()
                } else {
                    err_style()
                });
                pb.finish_with_message(msg);
            }
        }
    }
}

/// Notifier that only writes to the `tracing` log. Used with `--quiet`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn report_status(&self, status: &Status) {
        match status.kind {
            StatusKind::Failure => warn!(title = %status.title, text = %status.text, "status"),
            _ => info!(title = %status.title, text = %status.text, "status"),
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn report_status(&self, status: &Status) {
        (**self).report_status(status)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn report_status(&self, status: &Status) {
        (**self).report_status(status)
    }
}
