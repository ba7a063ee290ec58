//! Progress reporting for TTY and non-TTY environments.
//!
//! TTY mode: one spinner line per stage showing the remaining units.
//! Non-TTY mode: the same "Remaining" text as info log lines.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Central progress context owning the spinner area.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Create new context, detecting TTY automatically.
    pub fn new() -> Self {
        Self::with_tty(std::io::stderr().is_terminal())
    }

    /// Context that never draws (tests, redirected output)
    pub fn hidden() -> Self {
        Self::with_tty(false)
    }

    fn with_tty(is_tty: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty,
        }
    }

    /// Spinner line for a stage working through `total` units.
    pub fn units(&self, stage: &str, total: usize) -> UnitProgress {
        let bar = if self.is_tty {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {prefix:<24.cyan.bold} [{elapsed_precise}] {wide_msg}",
                )
                .expect("invalid template"),
            );
            pb.set_prefix(stage.to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };
        UnitProgress {
            bar,
            stage: stage.to_string(),
            done: 0,
            total,
            is_tty: self.is_tty,
        }
    }

    /// Whether running in TTY mode.
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Get reference to `MultiProgress` for the log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for `ProgressContext`.
pub type SharedProgress = Arc<ProgressContext>;

/// "Remaining: N out of T" counter for one stage.
pub struct UnitProgress {
    bar: ProgressBar,
    stage: String,
    done: usize,
    total: usize,
    is_tty: bool,
}

impl UnitProgress {
    /// Mark one unit finished and report what is left.
    pub fn advance(&mut self, label: &str) {
        self.done = (self.done + 1).min(self.total);
        let msg = format!(
            "Remaining: {} out of {}",
            fmt_num(self.remaining()),
            fmt_num(self.total)
        );
        if self.is_tty {
            self.bar.set_position(self.done as u64);
            self.bar.set_message(format!("{msg}  {label}"));
        } else {
            log::info!("{}: {msg}", self.stage);
        }
    }

    pub fn remaining(&self) -> usize {
        self.total - self.done
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

/// Count with `,` between thousands groups, e.g. `12,345`.
pub fn fmt_num(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.char_indices() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}
