//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// A sink records are fanned out to.
///
/// Appenders are called synchronously from the logging thread and must not
/// block for long; the broker sink only enqueues.
pub trait Appender: Send + Sync {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
