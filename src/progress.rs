//! Progress reporting for long-running discovery operators.
//!
//! Callbacks are invoked synchronously from an operator's loop; implementations may
//! batch them (e.g. every 256 iterations) to avoid callback overhead. Host applications
//! can use `IndicatifReporter` for user-visible progress bars; library callers can use
//! `NoopReporter` or provide their own implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

/// Trait for reporting progress of pipeline stages.
pub trait ProgressReporter: Send + Sync {
    /// Begin a new task with an optional total count.
    fn start(&self, task: &str, total: Option<u64>);

    /// Advance progress by the given amount.
    fn advance(&self, amount: u64);

    /// Mark the current task as finished.
    fn finish(&self);

    /// Display an informational message.
    fn message(&self, msg: &str);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _task: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn finish(&self) {}
    fn message(&self, _msg: &str) {}
}

/// Reporter backed by `indicatif` progress bars for CLI use.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    completed: AtomicU64,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            completed: AtomicU64::new(0),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, task: &str, total: Option<u64>) {
        self.completed.store(0, Ordering::Relaxed);
        if let Some(total) = total {
            self.bar.set_length(total);
            self.bar
                .set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})",
                    )
                    .unwrap()
                    .progress_chars("=> "),
                );
        } else {
            self.bar.set_length(0);
            self.bar
                .set_style(
                    ProgressStyle::with_template("{spinner:.green} {msg} {pos} items")
                        .unwrap(),
                );
        }
        self.bar.set_message(task.to_string());
        self.bar.reset();
    }

    fn advance(&self, amount: u64) {
        self.completed.fetch_add(amount, Ordering::Relaxed);
        self.bar.inc(amount);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}
