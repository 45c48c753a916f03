//! What a pipeline writes to

use crate::broker::BrokerConfig;
use crate::core::{LogLevel, Logger};
use std::fmt;
use std::fs::File;
use std::io::Write;

/// Sink selection for [`LogPipeline`](super::LogPipeline).
///
/// Everything is optional. Sinks are attached in a fixed order: console,
/// file, broker, then custom writers.
///
/// # Example
///
/// ```
/// use log_fanout::{BrokerConfig, LogLevel, PipelineConfig};
///
/// let config = PipelineConfig::new()
///     .console(true)
///     .broker(BrokerConfig::new("guest", "guest", "localhost", "5672").queue("logs"))
///     .min_level(LogLevel::Debug);
/// assert!(config.log_to_console);
/// ```
#[derive(Default)]
pub struct PipelineConfig {
    pub log_to_console: bool,
    pub log_to_file: Option<File>,
    pub log_to_broker: Option<BrokerConfig>,
    pub custom_writers: Vec<Box<dyn Write + Send>>,
    /// Pre-built logger to extend instead of creating a fresh one
    pub own_instance: Option<Logger>,
    pub min_level: Option<LogLevel>,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn console(mut self, enabled: bool) -> Self {
        self.log_to_console = enabled;
        self
    }

    #[must_use]
    pub fn file(mut self, file: File) -> Self {
        self.log_to_file = Some(file);
        self
    }

    #[must_use]
    pub fn broker(mut self, broker: BrokerConfig) -> Self {
        self.log_to_broker = Some(broker);
        self
    }

    #[must_use]
    pub fn custom_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.custom_writers.push(writer);
        self
    }

    #[must_use]
    pub fn own_instance(mut self, logger: Logger) -> Self {
        self.own_instance = Some(logger);
        self
    }

    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("log_to_console", &self.log_to_console)
            .field("log_to_file", &self.log_to_file.is_some())
            .field("log_to_broker", &self.log_to_broker)
            .field("custom_writers", &self.custom_writers.len())
            .field("own_instance", &self.own_instance.is_some())
            .field("min_level", &self.min_level)
            .finish()
    }
}
