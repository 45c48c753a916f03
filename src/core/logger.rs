//! Main logger implementation
//!
//! The logger is an explicitly owned object shared by `Arc`. Configuration
//! (`set_min_level`, `add_appender`) takes the write side of its locks; the
//! logging calls fan each record out synchronously to every appender.

use super::{
    appender::Appender,
    error::Result,
    fields::Fields,
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::PipelineMetrics,
};
use parking_lot::RwLock;
use std::error::Error as StdError;
use std::sync::Arc;

pub struct Logger {
    min_level: RwLock<LogLevel>,
    appenders: RwLock<Vec<Box<dyn Appender>>>,
    metrics: Arc<PipelineMetrics>,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(PipelineMetrics::new()))
    }

    /// Create a logger that reports into an existing metrics instance
    #[must_use]
    pub fn with_metrics(metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            min_level: RwLock::new(LogLevel::Info),
            appenders: RwLock::new(Vec::new()),
            metrics,
        }
    }

    /// Fan a record out to every appender.
    ///
    /// Each appender is wrapped in `catch_unwind` so one failing sink cannot
    /// keep the record from the others. Failures are counted and reported
    /// through `tracing`, never returned to the caller.
    fn dispatch<'a>(
        appenders: impl Iterator<Item = &'a mut Box<dyn Appender>>,
        entry: &LogEntry,
        metrics: &PipelineMetrics,
    ) {
        for appender in appenders {
            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(entry)
            }));

            match append_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    metrics.record_appender_failure();
                    tracing::warn!(appender = appender.name(), error = %e, "appender failed");
                }
                Err(panic_info) => {
                    metrics.record_appender_failure();
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(
                        appender = appender.name(),
                        panic = %panic_msg,
                        "appender panicked, other appenders continue"
                    );
                }
            }
        }
        metrics.record_logged();
    }

    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.appenders.write().push(appender);
    }

    /// Flush and detach every appender. Level and metrics are kept.
    pub fn clear_appenders(&self) {
        let mut appenders = self.appenders.write();
        for appender in appenders.iter_mut() {
            if let Err(e) = appender.flush() {
                tracing::warn!(appender = appender.name(), error = %e, "flush before detach failed");
            }
        }
        appenders.clear();
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= *self.min_level.read()
    }

    /// Names of the attached appenders, in fan-out order
    pub fn appender_names(&self) -> Vec<String> {
        self.appenders
            .read()
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    /// Write a fully built entry, subject to the minimum level
    pub fn log_entry(&self, entry: LogEntry) {
        if !self.is_enabled(entry.level) {
            return;
        }
        let mut appenders = self.appenders.write();
        Self::dispatch(appenders.iter_mut(), &entry, &self.metrics);
    }

    /// Write a record to every appender except those named in `skip`.
    ///
    /// The broker forwarder reports its own failures this way so that an
    /// outage never feeds back into the broker buffer.
    pub fn log_entry_excluding(&self, entry: LogEntry, skip: &[&str]) {
        if !self.is_enabled(entry.level) {
            return;
        }
        let mut appenders = self.appenders.write();
        Self::dispatch(
            appenders.iter_mut().filter(|a| !skip.contains(&a.name())),
            &entry,
            &self.metrics,
        );
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if !self.is_enabled(level) {
            return;
        }
        self.log_entry(LogEntry::new(level, message));
    }

    /// Log with structured fields
    pub fn log_with_fields(&self, level: LogLevel, message: impl AsRef<str>, fields: Fields) {
        if !self.is_enabled(level) {
            return;
        }
        self.log_entry(LogEntry::new(level, message).with_fields(fields));
    }

    /// Log with an attached error, rendered as the `error` field
    pub fn log_error(
        &self,
        level: LogLevel,
        message: impl AsRef<str>,
        err: &(dyn StdError + 'static),
    ) {
        if !self.is_enabled(level) {
            return;
        }
        self.log_entry(LogEntry::new(level, message).with_error(err));
    }

    #[inline]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Log at panic level. Unlike `std::panic!`, this does not unwind.
    #[inline]
    pub fn panic(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Panic, message);
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn shared_metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn flush(&self) -> Result<()> {
        let mut appenders = self.appenders.write();
        for appender in appenders.iter_mut() {
            appender.flush()?;
        }
        Ok(())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "failed to flush appenders on drop");
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use log_fanout::prelude::*;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .appender(ConsoleAppender::new())
///     .build();
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    appenders: Vec<Box<dyn Appender>>,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            appenders: Vec::new(),
            metrics: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_appender(mut self, appender: Box<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Logger {
        let logger = match self.metrics {
            Some(metrics) => Logger::with_metrics(metrics),
            None => Logger::new(),
        };
        logger.set_min_level(self.min_level);
        for appender in self.appenders {
            logger.add_appender(appender);
        }
        logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}
