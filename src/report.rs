//! Operator-facing progress and diagnostics.
//!
//! Probes never print directly; they go through a [`Reporter`] handed in by
//! the orchestrator, so output sinks stay swappable and tests stay quiet.

use std::fmt;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

/// Progress and diagnostic events emitted by probes.
///
/// `begin` with `total: None` starts an indeterminate task (a spinner);
/// with `Some(n)` a determinate one. At most one task is active at a time,
/// matching the strictly sequential sweep model.
pub trait Reporter: Send + Sync {
    /// Headline status, always shown.
    fn announce(&self, msg: &str);
    /// A discovered finding, always shown.
    fn found(&self, msg: &str);
    /// Supplementary context, always shown but rendered de-emphasized.
    fn detail(&self, msg: &str);
    /// Detail only shown in verbose mode.
    fn note(&self, msg: &str);
    /// An actionable error with the context it occurred in.
    fn fail(&self, context: &str, err: &dyn fmt::Display);
    /// Start a task; `total` is the number of steps when known.
    fn begin(&self, desc: &str, total: Option<u64>);
    /// Advance the active task by `n` steps.
    fn advance(&self, n: u64);
    /// Complete the active task.
    fn finish(&self, msg: &str);
}

/// Console implementation backed by indicatif.
pub struct ConsoleReporter {
    verbose: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            bar: Mutex::new(None),
        }
    }

    fn println(&self, msg: String) {
        // Route through the active bar so lines are not torn mid-render.
        match self.bar.lock().as_ref() {
            Some(bar) => bar.println(msg),
            None => println!("{}", msg),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn announce(&self, msg: &str) {
        self.println(msg.blue().to_string());
    }

    fn found(&self, msg: &str) {
        self.println(format!("    {}", msg.green()));
    }

    fn detail(&self, msg: &str) {
        self.println(msg.dimmed().to_string());
    }

    fn note(&self, msg: &str) {
        if self.verbose {
            self.println(msg.dimmed().to_string());
        }
    }

    fn fail(&self, context: &str, err: &dyn fmt::Display) {
        self.println(format!("{}", format!("[{}] {}", context, err).red().bold()));
    }

    fn begin(&self, desc: &str, total: Option<u64>) {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {msg} {pos}/{len} ({percent}%)")
                        .unwrap(),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap());
                bar
            }
        };
        bar.set_message(desc.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        *self.bar.lock() = Some(bar);
    }

    fn advance(&self, n: u64) {
        if let Some(bar) = self.bar.lock().as_ref() {
            bar.inc(n);
        }
    }

    fn finish(&self, msg: &str) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_and_clear();
        }
        if !msg.is_empty() {
            println!("{}", msg.green());
        }
    }
}

/// Discards everything. Used in tests.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn announce(&self, _msg: &str) {}
    fn found(&self, _msg: &str) {}
    fn detail(&self, _msg: &str) {}
    fn note(&self, _msg: &str) {}
    fn fail(&self, _context: &str, _err: &dyn fmt::Display) {}
    fn begin(&self, _desc: &str, _total: Option<u64>) {}
    fn advance(&self, _n: u64) {}
    fn finish(&self, _msg: &str) {}
}

/// Records events so tests can assert progress and output semantics
/// without a console.
#[cfg(test)]
pub struct CountingReporter {
    pub begun: Mutex<Vec<Option<u64>>>,
    pub advanced: Mutex<u64>,
    pub announced: Mutex<Vec<String>>,
    pub details: Mutex<Vec<String>>,
    pub failures: Mutex<Vec<String>>,
}

#[cfg(test)]
impl CountingReporter {
    pub fn new() -> Self {
        Self {
            begun: Mutex::new(Vec::new()),
            advanced: Mutex::new(0),
            announced: Mutex::new(Vec::new()),
            details: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl Reporter for CountingReporter {
    fn announce(&self, msg: &str) {
        self.announced.lock().push(msg.to_string());
    }
    fn found(&self, _msg: &str) {}
    fn detail(&self, msg: &str) {
        self.details.lock().push(msg.to_string());
    }
    fn note(&self, _msg: &str) {}
    fn fail(&self, context: &str, err: &dyn fmt::Display) {
        self.failures.lock().push(format!("{}: {}", context, err));
    }
    fn begin(&self, _desc: &str, total: Option<u64>) {
        self.begun.lock().push(total);
    }
    fn advance(&self, n: u64) {
        *self.advanced.lock() += n;
    }
    fn finish(&self, _msg: &str) {}
}
