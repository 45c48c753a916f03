//! File appender implementation

use crate::core::{Appender, LogEntry, LoggerError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Uncolored text records written to an open file.
///
/// The pipeline hands over a caller-owned `File`; opening, rotating and
/// closing the file beyond this appender's lifetime is the caller's business.
pub struct FileAppender {
    writer: BufWriter<File>,
}

impl FileAppender {
    /// Write to an already opened file handle
    pub fn from_file(file: File) -> Self {
        Self {
            writer: BufWriter::new(file),
        }
    }

    /// Open `path` in append mode, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    path.display().to_string(),
                    e,
                )
            })?;
        Ok(Self::from_file(file))
    }
}

impl Appender for FileAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut output = entry.to_text();
        output.push('\n');
        self.writer.write_all(output.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
