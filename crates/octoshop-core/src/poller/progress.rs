//! Synthetic progress for the poll loop.
//!
//! The backend reports no real progress, so this is an estimate: one percent
//! per poll tick, held below 100 until every job is terminal.

/// Shown while jobs are running.
pub const WORKING_TEXT: &str = "OctoShopping in action...";

/// Shown once the estimate has hit its cap.
pub const SLOW_TEXT: &str = "OctoShopping is taking longer than usual, hang tight!";

/// Shown when every job is terminal.
pub const READY_TEXT: &str = "Ready!";

/// A progress update for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Estimated completion, 0-100
    pub percent: u8,
    /// Status line for display
    pub message: &'static str,
    /// Jobs that reached a terminal state
    pub finished_jobs: usize,
    /// Jobs in this batch
    pub total_jobs: usize,
}

/// Monotonic percentage estimate.
#[derive(Debug, Clone)]
pub struct ProgressEstimate {
    percent: u8,
    cap: u8,
    finished: bool,
}

impl ProgressEstimate {
    /// `cap` is clamped to 99.
    pub fn new(cap: u8) -> Self {
        Self {
            percent: 0,
            cap: cap.min(99),
            finished: false,
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by one poll tick.
    pub fn tick(&mut self) -> u8 {
        if !self.finished {
            self.percent = self.percent.saturating_add(1).min(self.cap);
        }
        self.percent
    }

    /// Snap to 100 once the batch is terminal.
    pub fn finish(&mut self) -> u8 {
        self.finished = true;
        self.percent = 100;
        self.percent
    }

    pub fn message(&self) -> &'static str {
        if self.finished {
            READY_TEXT
        } else if self.percent >= self.cap {
            SLOW_TEXT
        } else {
            WORKING_TEXT
        }
    }

    pub(crate) fn snapshot(&self, finished_jobs: usize, total_jobs: usize) -> Progress {
        Progress {
            percent: self.percent,
            message: self.message(),
            finished_jobs,
            total_jobs,
        }
    }
}
