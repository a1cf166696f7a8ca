//! Logging configuration.
//!
//! Every enabled target gets its own `tracing-subscriber` layer behind a
//! single level filter.

use std::{fs::OpenOptions, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use tracing_subscriber::{
    Layer, filter::LevelFilter, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Where log records go and how verbose they are.
///
/// Read from the `log` section of the configuration file. Any combination of
/// targets may be enabled at once.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Appends logs to this file when set.
    /// The file is created if it does not exist.
    #[serde(default = "LogConfig::default_file_path")]
    pub file_path: Option<PathBuf>,

    /// Sends logs to the systemd journal.
    #[serde(default = "LogConfig::default_emit_journald")]
    pub emit_journald: bool,

    /// Writes logs to standard output.
    #[serde(default = "LogConfig::default_emit_stdout")]
    pub emit_stdout: bool,

    /// Writes logs to standard error.
    #[serde(default = "LogConfig::default_emit_stderr")]
    pub emit_stderr: bool,

    /// Records below this level are discarded.
    /// Overridden by `--log-level` on the command line.
    #[serde(default = "LogConfig::default_log_level")]
    #[serde_as(as = "DisplayFromStr")]
    pub level: tracing::Level,
}

impl Default for LogConfig {
    /// `INFO` records on standard output only.
    fn default() -> Self {
        Self {
            file_path: Self::default_file_path(),
            emit_journald: Self::default_emit_journald(),
            emit_stdout: Self::default_emit_stdout(),
            emit_stderr: Self::default_emit_stderr(),
            level: Self::default_log_level(),
        }
    }
}

impl LogConfig {
    /// Returns `INFO`.
    #[inline]
    #[must_use]
    pub const fn default_log_level() -> tracing::Level { tracing::Level::INFO }

    /// No log file by default.
    #[inline]
    #[must_use]
    pub const fn default_file_path() -> Option<PathBuf> { None }

    /// Journald is off by default.
    #[inline]
    #[must_use]
    pub const fn default_emit_journald() -> bool { false }

    /// Standard output is on by default.
    #[inline]
    #[must_use]
    pub const fn default_emit_stdout() -> bool { true }

    /// Standard error is off by default.
    #[inline]
    #[must_use]
    pub const fn default_emit_stderr() -> bool { false }

    /// Moves the stdout target to stderr.
    ///
    /// Used by commands whose standard output carries data.
    #[must_use]
    pub const fn without_stdout(mut self) -> Self {
        if self.emit_stdout {
            self.emit_stdout = false;
            self.emit_stderr = true;
        }
        self
    }

    /// Installs the global subscriber.
    ///
    /// Targets that cannot be opened are skipped.
    ///
    /// # Panics
    ///
    /// Panics when a global subscriber is already installed.
    pub fn registry(&self) {
        let layers = self.drivers().into_iter().filter_map(LogDriver::layer).collect::<Vec<_>>();
        tracing_subscriber::registry()
            .with(LevelFilter::from_level(self.level))
            .with(layers)
            .init();
    }

    /// Enabled targets, in the order their layers are stacked.
    fn drivers(&self) -> Vec<LogDriver> {
        let Self { emit_journald, file_path, emit_stdout, emit_stderr, .. } = self;
        [
            emit_journald.then_some(LogDriver::Journald),
            file_path.clone().map(LogDriver::File),
            emit_stdout.then_some(LogDriver::Stdout),
            emit_stderr.then_some(LogDriver::Stderr),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// A single log target.
#[derive(Clone, Debug, Eq, PartialEq)]
enum LogDriver {
    /// The systemd journal.
    Journald,

    /// A file opened in append mode, written without ANSI colors.
    File(PathBuf),

    /// Standard output.
    Stdout,

    /// Standard error.
    Stderr,
}

impl LogDriver {
    /// Builds the `tracing` layer for this target.
    ///
    /// Returns `None` and reports to standard error when the target is not
    /// available, so that the remaining targets still get installed.
    #[allow(clippy::type_repetition_in_bounds)]
    fn layer<S>(self) -> Option<Box<dyn Layer<S> + Send + Sync + 'static>>
    where
        S: tracing::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        let fmt = tracing_subscriber::fmt::layer().with_target(true);
        let layer: Box<dyn Layer<S> + Send + Sync> = match self {
            Self::Journald => match tracing_journald::layer() {
                Ok(layer) => Box::new(layer),
                Err(err) => {
                    eprintln!("journald is unreachable, error: {err}");
                    return None;
                }
            },
            Self::File(path) => match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Box::new(fmt.with_ansi(false).with_writer(file)),
                Err(err) => {
                    eprintln!("Failed to open log file {}, error: {err}", path.display());
                    return None;
                }
            },
            Self::Stdout => Box::new(fmt.with_writer(std::io::stdout)),
            Self::Stderr => Box::new(fmt.with_writer(std::io::stderr)),
        };
        Some(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_stdout_moves_to_stderr() {
        let config = LogConfig::default().without_stdout();
        assert!(!config.emit_stdout);
        assert!(config.emit_stderr);

        let config = LogConfig { emit_stdout: false, ..LogConfig::default() }.without_stdout();
        assert!(!config.emit_stderr);
    }

    #[test]
    fn test_drivers_follow_flags() {
        assert_eq!(LogConfig::default().drivers(), [LogDriver::Stdout]);
        assert_eq!(LogConfig::default().without_stdout().drivers(), [LogDriver::Stderr]);

        let config = LogConfig {
            emit_journald: true,
            file_path: Some(PathBuf::from("/var/log/tzinject.log")),
            ..LogConfig::default()
        };
        assert_eq!(config.drivers(), [
            LogDriver::Journald,
            LogDriver::File(PathBuf::from("/var/log/tzinject.log")),
            LogDriver::Stdout,
        ]);
    }

    #[test]
    fn test_level_from_yaml() {
        let config: LogConfig = serde_yaml::from_str("level: debug\nemitJournald: true\n").unwrap();
        assert_eq!(config.level, tracing::Level::DEBUG);
        assert!(config.emit_journald);
        assert!(config.emit_stdout);
    }
}
