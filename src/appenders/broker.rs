//! Producer side of the broker path
//!
//! Records are rendered to their JSON line and copied into the shared
//! [`RecordBuffer`]. A full buffer drops the record: the logging call still
//! succeeds, the drop is counted, and an operator-facing warning is emitted
//! on the first drop and every 1000th after it.

use crate::broker::RecordBuffer;
use crate::core::{Appender, LogEntry, PipelineMetrics, Result};
use std::io;
use std::sync::Arc;

pub const BROKER_APPENDER_NAME: &str = "broker";

#[derive(Clone)]
pub struct BrokerAppender {
    buffer: Arc<RecordBuffer>,
    metrics: Arc<PipelineMetrics>,
}

impl BrokerAppender {
    pub fn new(buffer: Arc<RecordBuffer>, metrics: Arc<PipelineMetrics>) -> Self {
        Self { buffer, metrics }
    }

    /// Offer one payload to the buffer; `false` means it was dropped
    pub fn offer(&self, payload: &[u8]) -> bool {
        if self.buffer.enqueue(payload) {
            self.metrics.record_enqueued();
            return true;
        }

        let previous = self.metrics.record_dropped();
        let dropped = previous + 1;
        if previous == 0 || dropped % 1000 == 0 {
            tracing::warn!(
                dropped,
                capacity = self.buffer.capacity(),
                "broker buffer full, log records dropped"
            );
        }
        false
    }
}

impl Appender for BrokerAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let line = entry.to_json_line()?;
        self.offer(&line);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        BROKER_APPENDER_NAME
    }
}

/// Byte-stream face of the broker path.
///
/// `write` always reports the full length, dropped or not, so producers
/// that treat short writes as failures keep logging during an outage.
impl io::Write for BrokerAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.offer(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::io::Write;

    fn appender(capacity: usize) -> (BrokerAppender, Arc<RecordBuffer>, Arc<PipelineMetrics>) {
        let buffer = Arc::new(RecordBuffer::new(capacity));
        let metrics = Arc::new(PipelineMetrics::new());
        (
            BrokerAppender::new(Arc::clone(&buffer), Arc::clone(&metrics)),
            buffer,
            metrics,
        )
    }

    #[test]
    fn test_write_reports_full_length_even_when_dropped() {
        let (mut appender, buffer, metrics) = appender(1);

        assert_eq!(appender.write(b"kept").unwrap(), 4);
        assert_eq!(appender.write(b"dropped").unwrap(), 7);

        assert_eq!(buffer.len(), 1);
        assert_eq!(metrics.enqueued_count(), 1);
        assert_eq!(metrics.dropped_count(), 1);
    }

    #[test]
    fn test_append_enqueues_json_line() {
        let (mut appender, buffer, _) = appender(4);
        appender
            .append(&LogEntry::new(LogLevel::Info, "shipped"))
            .unwrap();

        let payload = buffer.try_dequeue().unwrap();
        assert_eq!(payload.last(), Some(&b'\n'));
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["message"], "shipped");
        assert_eq!(value["level"], "info");
    }

    #[test]
    fn test_append_never_errors_on_full_buffer() {
        let (mut appender, _, metrics) = appender(1);
        for i in 0..5 {
            let entry = LogEntry::new(LogLevel::Warn, format!("record {i}"));
            assert!(appender.append(&entry).is_ok());
        }
        assert_eq!(metrics.dropped_count(), 4);
    }
}
