//! Throttled progress reporting

use std::sync::Arc;

/// Callback receiving a description and a completion fraction in [0, 1]
///
/// Invoked on the thread driving the search, so it must return quickly.
pub type ProgressCallback = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// Calls a `ProgressCallback` every `interval` commits and once at the end
pub(crate) struct ProgressReporter {
    callback: Option<ProgressCallback>,
    interval: usize,
    total: Option<usize>,
    last_reported: usize,
}

impl ProgressReporter {
    pub(crate) fn new(callback: Option<ProgressCallback>, interval: usize) -> Self {
        Self {
            callback,
            interval: interval.max(1),
            total: None,
            last_reported: 0,
        }
    }

    /// Expected number of commits, used for the completion fraction
    pub(crate) fn set_total(&mut self, total: usize) {
        self.total = Some(total);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn fraction(&self, commits: usize) -> f64 {
        match self.total {
            Some(total) if total > 0 => (commits as f64 / total as f64).min(1.0),
            _ => 0.0,
        }
    }

    /// Report after a commit when at least `interval` commits passed since the last call
    pub(crate) fn tick(&mut self, commits: usize, results: usize) {
        let Some(callback) = &self.callback else {
            return;
        };
        if commits < self.last_reported + self.interval {
            return;
        }
        self.last_reported = commits;

        let description = match self.total {
            Some(total) => format!(
                "Searched {}/{} commits, {} results",
                commits, total, results
            ),
            None => format!("Searched {} commits, {} results", commits, results),
        };
        let fraction = self.fraction(commits);
        tracing::debug!("{} ({:.0}%)", description, fraction * 100.0);
        callback(&description, fraction);
    }

    /// Final report, always 1.0
    pub(crate) fn finish(&mut self, description: &str) {
        if let Some(callback) = &self.callback {
            callback(description, 1.0);
        }
    }
}
