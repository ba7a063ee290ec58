//! Logging setup: env_logger, routed through indicatif when a spinner is live

use indicatif::MultiProgress;

/// Default log verbosity, before `RUST_LOG` overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if debug {
            Self::Debug
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    fn filter(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Debug => "debug",
        }
    }
}

/// Padded label, plus ANSI color when writing to a terminal.
fn level_style(level: log::Level, color: bool) -> (&'static str, &'static str, &'static str) {
    let (ansi, label) = match level {
        log::Level::Error => ("\x1b[31m", "ERROR"),
        log::Level::Warn => ("\x1b[33m", "WARN "),
        log::Level::Info => ("\x1b[32m", "INFO "),
        log::Level::Debug => ("\x1b[36m", "DEBUG"),
        log::Level::Trace => ("\x1b[35m", "TRACE"),
    };
    if color {
        (ansi, label, "\x1b[0m")
    } else {
        ("", label, "")
    }
}

/// Logger that suspends the progress spinner while printing a line.
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.inner.enabled(record.metadata()) {
            return;
        }
        let (pre, label, post) = level_style(record.level(), true);
        let line = format!("[{pre}{label}{post}] {}", record.args());
        self.multi.suspend(|| eprintln!("{line}"));
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the global logger.
///
/// With `multi` (TTY) lines go through [`IndicatifLogger`]; without it they
/// are plain `[LEVEL] message` lines suitable for redirection to a file.
/// Calling twice is harmless: the second install is ignored.
pub fn init_logging(verbosity: Verbosity, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let env = env_logger::Env::default().default_filter_or(verbosity.filter());

    match multi {
        Some(multi) => {
            let logger = env_logger::Builder::from_env(env).build();
            let max_level = logger.filter();
            if log::set_boxed_logger(Box::new(IndicatifLogger::new(logger, multi.clone())))
                .is_ok()
            {
                log::set_max_level(max_level);
            }
        }
        None => {
            let _ = env_logger::Builder::from_env(env)
                .format(|buf, record| {
                    let (_, label, _) = level_style(record.level(), false);
                    writeln!(buf, "[{label}] {}", record.args())
                })
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_debug_wins() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn plain_labels_have_no_ansi() {
        let (pre, label, post) = level_style(log::Level::Warn, false);
        assert_eq!((pre, label, post), ("", "WARN ", ""));
    }

    #[test]
    fn colored_labels_reset() {
        let (pre, _, post) = level_style(log::Level::Error, true);
        assert!(pre.starts_with("\x1b["));
        assert_eq!(post, "\x1b[0m");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging(Verbosity::Quiet, None);
        init_logging(Verbosity::Debug, None);
    }
}
