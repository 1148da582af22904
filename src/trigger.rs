//! Inbound side: what decides *when* a snapshot runs.
//!
//! [`Trigger`] serializes requests with a busy flag so two snapshots never
//! interleave their `add`/`commit` pairs. [`Trigger::guard`] versions the tree
//! up front and snapshots once [`wait_for_quit`] returns, which is what
//! `profv guard` does.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::git::{Probe, ProcessRunner};
use crate::notify::Notifier;
use crate::session::{Outcome, Report, RepositorySession};

/// Anything that can take a snapshot on request.
pub trait Snapshot {
    fn request_snapshot(&self) -> Report;

    /// Get ready for later snapshots (e.g. create the repository).
    /// `None` means there was nothing to do.
    fn prepare(&self) -> Option<Outcome> {
        None
    }
}

impl<R: ProcessRunner, N: Notifier, P: Probe> Snapshot for RepositorySession<R, N, P> {
    fn request_snapshot(&self) -> Report {
        RepositorySession::request_snapshot(self)
    }

    fn prepare(&self) -> Option<Outcome> {
        RepositorySession::prepare(self)
    }
}

/// Single-active-session guard around a [`Snapshot`].
pub struct Trigger<S> {
    target: S,
    busy: AtomicBool,
}

impl<S: Snapshot> Trigger<S> {
    pub fn new(target: S) -> Self {
        Self {
            target,
            busy: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    /// Run one snapshot unless another is in flight.
    ///
    /// Returns `None` when the request was dropped because the trigger is busy.
    pub fn fire(&self) -> Option<Report> {
        let _release = self.acquire()?;
        debug!("snapshot requested");
        Some(self.target.request_snapshot())
    }

    /// Run [`Snapshot::prepare`] under the busy flag.
    ///
    /// Returns `None` when another request is in flight.
    pub fn arm(&self) -> Option<Report> {
        let _release = self.acquire()?;
        Some(Report {
            outcomes: self.target.prepare().into_iter().collect(),
        })
    }

    /// Prepare now, block in `wait`, then take one snapshot.
    ///
    /// A failed preparation (missing tool, failed bootstrap) ends the guard
    /// before waiting. The returned report holds the preparation outcome, if
    /// any, followed by the snapshot's outcomes.
    pub fn guard(&self, wait: impl FnOnce() -> Result<()>) -> Result<Report> {
        let mut report = self.arm().unwrap_or_default();
        if !report.outcomes.iter().all(Outcome::is_success) {
            return Ok(report);
        }
        wait()?;
        if let Some(snapshot) = self.fire() {
            report.outcomes.extend(snapshot.outcomes);
        }
        Ok(report)
    }

    fn acquire(&self) -> Option<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("snapshot already running, ignoring request");
            return None;
        }
        Some(BusyGuard(&self.busy))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Block until Ctrl+C or SIGTERM arrives.
///
/// # Errors
/// Fails if the signal handler cannot be installed (e.g. one already is).
pub fn wait_for_quit() -> Result<()> {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("failed to install quit signal handler")?;
    rx.recv().context("quit signal channel closed")?;
    debug!("quit requested");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Failure;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    struct Reentrant {
        trigger: std::sync::OnceLock<Arc<Trigger<Arc<Reentrant>>>>,
        nested: std::sync::Mutex<Option<Option<Report>>>,
        runs: AtomicUsize,
    }

    impl Snapshot for Arc<Reentrant> {
        fn request_snapshot(&self) -> Report {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if let Some(t) = self.trigger.get() {
                let inner = t.fire();
                *self.nested.lock().unwrap() = Some(inner);
            }
            Report {
                outcomes: vec![Outcome::Created],
            }
        }
    }

    struct Counting(AtomicUsize);

    impl Snapshot for Counting {
        fn request_snapshot(&self) -> Report {
            self.0.fetch_add(1, Ordering::SeqCst);
            Report {
                outcomes: vec![Outcome::Created],
            }
        }
    }

    /// Records the order of prepare / wait / snapshot calls.
    struct Sequenced {
        prepared: Option<Outcome>,
        events: std::sync::Mutex<Vec<&'static str>>,
    }

    impl Sequenced {
        fn new(prepared: Option<Outcome>) -> Self {
            Self {
                prepared,
                events: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn push(&self, event: &'static str) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl Snapshot for Sequenced {
        fn request_snapshot(&self) -> Report {
            self.push("snapshot");
            Report {
                outcomes: vec![Outcome::Created],
            }
        }

        fn prepare(&self) -> Option<Outcome> {
            self.push("prepare");
            self.prepared
        }
    }

    #[test]
    fn guard_prepares_before_waiting_and_snapshots_after() {
        let t = Trigger::new(Sequenced::new(Some(Outcome::Initialized)));

        let report = t
            .guard(|| {
                t.target().push("wait");
                Ok(())
            })
            .unwrap();

        assert_eq!(*t.target().events.lock().unwrap(), ["prepare", "wait", "snapshot"]);
        assert_eq!(report.outcomes, vec![Outcome::Initialized, Outcome::Created]);
        assert!(!t.is_busy());
    }

    #[test]
    fn guard_on_existing_repository_reports_only_the_snapshot() {
        let t = Trigger::new(Sequenced::new(None));
        let report = t.guard(|| Ok(())).unwrap();
        assert_eq!(report.outcomes, vec![Outcome::Created]);
    }

    #[test]
    fn guard_stops_when_preparation_fails() {
        let t = Trigger::new(Sequenced::new(Some(Outcome::Failed(Failure::ToolNotFound))));

        let report = t
            .guard(|| {
                t.target().push("wait");
                Ok(())
            })
            .unwrap();

        assert_eq!(*t.target().events.lock().unwrap(), ["prepare"]);
        assert_eq!(report.outcomes, vec![Outcome::Failed(Failure::ToolNotFound)]);
        assert!(!report.is_success());
    }

    #[test]
    fn guard_propagates_wait_errors_without_snapshot() {
        let t = Trigger::new(Sequenced::new(None));
        assert!(t.guard(|| anyhow::bail!("no handler")).is_err());
        assert_eq!(*t.target().events.lock().unwrap(), ["prepare"]);
    }

    #[test]
    fn fire_runs_snapshot_and_releases() {
        let t = Trigger::new(Counting(AtomicUsize::new(0)));
        assert!(t.fire().is_some());
        assert!(t.fire().is_some());
        assert!(!t.is_busy());
        assert_eq!(t.target().0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn request_while_busy_is_dropped() {
        let target = Arc::new(Reentrant {
            trigger: std::sync::OnceLock::new(),
            nested: std::sync::Mutex::new(None),
            runs: AtomicUsize::new(0),
        });
        let trigger = Arc::new(Trigger::new(Arc::clone(&target)));
        let _ = target.trigger.set(Arc::clone(&trigger));

        let outer = trigger.fire();

        assert!(outer.is_some());
        assert_eq!(*target.nested.lock().unwrap(), Some(None));
        assert_eq!(target.runs.load(Ordering::SeqCst), 1);
        assert!(!trigger.is_busy());
    }
}
