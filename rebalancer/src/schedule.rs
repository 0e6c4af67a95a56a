//! Fixed-interval scheduler for repeated rebalance passes.
//!
//! Passes run back to back on one thread, so they can never overlap. A
//! failed pass is logged and the loop carries on with the next tick.

use std::time::Duration;

use log::{error, info};

use crate::error::Result;

/// Outcome counts of a finished schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub passes: usize,
    pub failures: usize,
}

/// Runs a pass immediately, then once per `interval`.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
    max_runs: Option<usize>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_runs: None,
        }
    }

    /// Stop after `runs` passes instead of looping forever.
    pub fn with_max_runs(mut self, runs: Option<usize>) -> Self {
        self.max_runs = runs;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `pass` on schedule, calling `sleep` between passes.
    ///
    /// `pass` receives the 1-based pass number. Returns only when
    /// `max_runs` is reached; `Some(0)` runs nothing.
    pub fn run<P, S>(&self, mut pass: P, mut sleep: S) -> ScheduleSummary
    where
        P: FnMut(usize) -> Result<()>,
        S: FnMut(Duration),
    {
        let mut summary = ScheduleSummary::default();
        if self.max_runs == Some(0) {
            return summary;
        }
        loop {
            let n = summary.passes + 1;
            info!("Starting scheduled pass {n}");
            if let Err(e) = pass(n) {
                error!("Scheduled pass {n} failed: {e}");
                summary.failures += 1;
            }
            summary.passes = n;

            if self.max_runs.is_some_and(|max| summary.passes >= max) {
                return summary;
            }
            info!("Next pass in {}s", self.interval.as_secs());
            sleep(self.interval);
        }
    }
}
