//! Explicit diagnostics sink
//!
//! Components never log through a process-wide logger. Instead each one is handed a
//! [`Diagnostics`] value at construction which wraps a [`log::Log`] implementation (usually the
//! fern dispatch built by [`crate::logger::logger_init`]) and the target name records are tagged
//! with. Dropping the last handle tears the sink down with its owner.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt;
use std::sync::{Arc, Mutex};

pub use log::Level;
use log::{Log, Metadata, Record};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A cloneable handle onto a diagnostics sink, tagged with a target name.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn Log>,
    target: String,
}

/// A sink which discards every record.
struct NullSink;

/// A sink which keeps every record in memory.
///
/// Used by tests to inspect what a component reported.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<CapturedRecord>>,
}

/// A single record kept by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Diagnostics {
    /// Wrap a sink, tagging records with `target`.
    pub fn new(sink: Arc<dyn Log>, target: &str) -> Self {
        Self {
            sink,
            target: target.to_string(),
        }
    }

    /// A handle which drops everything, for components built without a logger.
    pub fn null() -> Self {
        Self::new(Arc::new(NullSink), "null")
    }

    /// Create a handle onto the same sink for a sub-component.
    ///
    /// The new target is `<parent>::<name>`.
    pub fn scoped(&self, name: &str) -> Self {
        Self {
            sink: self.sink.clone(),
            target: format!("{}::{}", self.target, name),
        }
    }

    /// The target records from this handle are tagged with.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Emit a record at the given level.
    pub fn log(&self, level: Level, args: fmt::Arguments) {
        let metadata = Metadata::builder()
            .level(level)
            .target(&self.target)
            .build();

        if !self.sink.enabled(&metadata) {
            return;
        }

        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .build(),
        );
    }

    /// Flush any buffered records.
    pub fn flush(&self) {
        self.sink.flush()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("target", &self.target)
            .finish()
    }
}

impl Log for NullSink {
    fn enabled(&self, _: &Metadata) -> bool {
        false
    }

    fn log(&self, _: &Record) {}

    fn flush(&self) {}
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copy out all captured records.
    pub fn records(&self) -> Vec<CapturedRecord> {
        match self.records.lock() {
            Ok(r) => r.clone(),
            Err(p) => p.into_inner().clone(),
        }
    }

    /// Return true if any record at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }
}

impl Log for MemorySink {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let captured = CapturedRecord {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };

        match self.records.lock() {
            Ok(mut r) => r.push(captured),
            Err(p) => p.into_inner().push(captured),
        }
    }

    fn flush(&self) {}
}

// ---------------------------------------------------------------------------
// MACROS
// ---------------------------------------------------------------------------

#[macro_export]
macro_rules! diag_error {
    ($diag:expr, $($arg:tt)+) => (
        $diag.log($crate::diag::Level::Error, std::format_args!($($arg)+))
    );
}

#[macro_export]
macro_rules! diag_warn {
    ($diag:expr, $($arg:tt)+) => (
        $diag.log($crate::diag::Level::Warn, std::format_args!($($arg)+))
    );
}

#[macro_export]
macro_rules! diag_info {
    ($diag:expr, $($arg:tt)+) => (
        $diag.log($crate::diag::Level::Info, std::format_args!($($arg)+))
    );
}

#[macro_export]
macro_rules! diag_debug {
    ($diag:expr, $($arg:tt)+) => (
        $diag.log($crate::diag::Level::Debug, std::format_args!($($arg)+))
    );
}

#[macro_export]
macro_rules! diag_trace {
    ($diag:expr, $($arg:tt)+) => (
        $diag.log($crate::diag::Level::Trace, std::format_args!($($arg)+))
    );
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scoped_targets() {
        let sink = MemorySink::new();
        let diag = Diagnostics::new(sink.clone(), "arm");
        let bus = diag.scoped("bus");

        diag_info!(diag, "root {}", 1);
        diag_warn!(bus, "child {}", 2);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target, "arm");
        assert_eq!(records[0].message, "root 1");
        assert_eq!(records[1].target, "arm::bus");
        assert_eq!(records[1].level, Level::Warn);
        assert!(sink.contains(Level::Warn, "child"));
    }

    #[test]
    fn test_null_sink_discards() {
        let diag = Diagnostics::null();
        diag_error!(diag, "nobody hears this");
        assert_eq!(diag.target(), "null");
    }
}
