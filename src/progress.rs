//! Sub-step progress reporting for long-running step actions.
//!
//! A step action owns a [`ProgressTracker`] and reports each sub-step as it
//! completes. The presentation layer reads [`ProgressSnapshot`]s, possibly
//! from another task, and renders `done/total` plus the message log.

use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    done: usize,
    total: usize,
    lines: Vec<String>,
}

/// Shared progress counter of the step currently running.
///
/// Cloning yields another handle to the same counter.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<Inner>>,
}

/// Point-in-time copy of a tracker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Sub-steps completed
    pub done: usize,
    /// Expected number of sub-steps
    pub total: usize,
    /// `done/total - message` log, oldest first
    pub lines: Vec<String>,
}

impl ProgressSnapshot {
    /// Completed fraction in `0.0..=1.0`
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.done as f64 / self.total as f64
    }

    /// Most recent message, if any
    pub fn last_line(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

impl ProgressTracker {
    /// New tracker expecting `total` sub-steps
    pub fn new(total: usize) -> Self {
        let tracker = Self::default();
        tracker.lock().total = total;
        tracker
    }

    // A panic while holding the lock only leaves counters behind, so a
    // poisoned mutex is still safe to read.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reset for a new step
    pub fn start(&self, total: usize) {
        let mut inner = self.lock();
        inner.done = 0;
        inner.total = total;
        inner.lines.clear();
    }

    /// Change the expected number of sub-steps.
    ///
    /// Used when an action discovers that part of its work is already done;
    /// never drops below what has already been reported.
    pub fn set_total(&self, total: usize) {
        let mut inner = self.lock();
        inner.total = total.max(inner.done);
    }

    /// Record one completed sub-step.
    pub fn report_step(&self, message: impl AsRef<str>) {
        let mut inner = self.lock();
        inner.done += 1;
        if inner.done > inner.total {
            inner.total = inner.done;
        }
        let line = format!("{}/{} - {}", inner.done, inner.total, message.as_ref());
        log::debug!("{}", line);
        inner.lines.push(line);
    }

    /// Record a final sub-step, shrinking the total so the counter reads complete
    pub fn finish(&self, message: impl AsRef<str>) {
        let mut inner = self.lock();
        inner.done += 1;
        inner.total = inner.done;
        let line = format!("{}/{} - {}", inner.done, inner.total, message.as_ref());
        log::debug!("{}", line);
        inner.lines.push(line);
    }

    /// Append a message without advancing the counter
    pub fn note(&self, message: impl AsRef<str>) {
        let mut inner = self.lock();
        let line = format!("{}/{} - {}", inner.done, inner.total, message.as_ref());
        inner.lines.push(line);
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ProgressSnapshot {
        let inner = self.lock();
        ProgressSnapshot {
            done: inner.done,
            total: inner.total,
            lines: inner.lines.clone(),
        }
    }
}
