//! Core logger types and traits

pub mod appender;
pub mod error;
pub mod fields;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;

pub use appender::Appender;
pub use error::{LoggerError, Result};
pub use fields::{FieldValue, Fields};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::PipelineMetrics;
