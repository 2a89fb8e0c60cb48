//! Session management

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// A chrono format string which diplays a timestamp. See
/// https://docs.rs/chrono/0.4.11/chrono/format/strftime/index.html for more
/// information.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Number of nanoseconds in a second
const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A struct storing information about the current session
#[derive(Clone, Debug)]
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,

    /// The time the session was started
    pub epoch: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (ARTISAN_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session within the given directory.
    ///
    /// This will create a new session directory named `{exec_name}_{timestamp}`
    /// inside `<sw_root>/<sessions_dir>`.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        let mut path = root;
        path.push(sessions_dir);

        Self::new_in(exec_name, path)
    }

    /// Start a new session inside an explicit parent directory.
    pub fn new_in(exec_name: &str, parent: PathBuf) -> Result<Self, SessionError> {
        let epoch = Utc::now();

        // Create the session path
        let mut path = parent;
        path.push(format!("{}_{}", exec_name, epoch.format(TIMESTAMP_FORMAT)));

        // Create the directory
        match fs::create_dir_all(path.clone()) {
            Ok(_) => (),
            Err(e) => return Err(SessionError::CannotCreateDir(e)),
        };

        // Create the log file path
        let mut log_file_path = path.clone();
        log_file_path.push(format!("{}.log", exec_name));

        Ok(Session {
            session_root: path,
            log_file_path,
            epoch,
        })
    }

    /// Get the number of seconds elapsed since the start of the session.
    pub fn elapsed_seconds(&self) -> f64 {
        elapsed_seconds_since(&self.epoch)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since `epoch`, or NaN on overflow.
pub fn elapsed_seconds_since(epoch: &DateTime<Utc>) -> f64 {
    match (Utc::now() - *epoch).num_nanoseconds() {
        Some(ns) => ns as f64 / NANOS_PER_SECOND,
        None => std::f64::NAN,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_in_creates_dirs() {
        let parent = std::env::temp_dir().join("util_session_test");
        let session = Session::new_in("arm_exec", parent.clone()).unwrap();

        assert!(session.session_root.is_dir());
        assert!(session.session_root.starts_with(&parent));
        assert_eq!(session.log_file_path.file_name().unwrap(), "arm_exec.log");
        assert!(session.elapsed_seconds() >= 0.0);

        std::fs::remove_dir_all(&parent).unwrap();
    }
}
