//! Generic logger utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use std::sync::Arc;
use thiserror::Error;

// Internal imports
use crate::diag::Diagnostics;
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the logger for this execution.
///
/// Records are written to stdout and the session's log file. The dispatch is not installed as
/// the global logger, instead it is returned as a [`Diagnostics`] handle with target
/// `exec_name` which must be passed to the components that need it.
///
/// # Notes
///
/// - `min_level` must be greater than `log::Level::Info`.
pub fn logger_init(
    min_level: LevelFilter,
    exec_name: &str,
    session: &session::Session
) -> Result<Diagnostics, LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let epoch = session.epoch;

    // Setup the logger using fern's builder pattern
    let (_, dispatch) = fern::Dispatch::new()
        .format(move |out, message, record| {

            // If debug or trace include the target, otherwise don't include it
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::elapsed_seconds_since(&epoch),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            }
            else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::elapsed_seconds_since(&epoch),
                    level_to_str(record.level()),
                    message
                ))
            }

        })
        .level(min_level)
        .chain(std::io::stdout())
        .chain(match fern::log_file(session.log_file_path.clone()) {
            Ok(f) => f,
            Err(e) => return Err(LoggerInitError::LogFileInitError(e))
        })
        .into_log();

    let diag = Diagnostics::new(Arc::from(dispatch), exec_name);

    diag_info!(diag, "Logging initialised");
    diag_info!(diag, "    Session epoch: {}", session.epoch);
    diag_info!(diag, "    Log level: {:?}", min_level);
    diag_info!(diag, "    Log file path: {:?}", session.log_file_path);

    Ok(diag)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rejects_quiet_levels() {
        let parent = std::env::temp_dir().join("util_logger_test");
        let session = session::Session::new_in("logger_test", parent.clone()).unwrap();

        match logger_init(LevelFilter::Warn, "logger_test", &session) {
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn)) => (),
            r => panic!("Expected InvalidMinLogLevel, got {:?}", r.map(|_| ()))
        }

        let diag = logger_init(LevelFilter::Debug, "logger_test", &session).unwrap();
        diag_info!(diag, "written to the session log");
        diag.flush();
        assert!(session.log_file_path.exists());

        std::fs::remove_dir_all(&parent).unwrap();
    }
}
