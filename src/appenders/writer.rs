//! Appender over a caller-supplied byte stream

use crate::core::{Appender, LogEntry, Result};
use parking_lot::Mutex;
use std::io::Write;

/// Sends each record's JSON line to an arbitrary `Write` implementation.
///
/// Used for the custom writers a host plugs into the pipeline. The writer
/// sits behind a mutex so any `Write + Send` type qualifies.
pub struct WriterAppender {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterAppender {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self::named("writer", writer)
    }

    pub fn named(name: impl Into<String>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(writer),
        }
    }
}

impl Appender for WriterAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let line = entry.to_json_line()?;
        self.writer.get_mut().write_all(&line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.get_mut().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
