//! # Log Fanout
//!
//! Process-local log pipeline that writes every record to a set of sinks:
//! console, file, arbitrary writers and a message broker.
//!
//! The broker path never blocks the caller. Records are copied into a
//! bounded buffer and a single background task drains it into the broker,
//! reconnecting after failures until the pipeline is stopped.
//!
//! ```no_run
//! use log_fanout::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> log_fanout::Result<()> {
//! let config = PipelineConfig::new()
//!     .console(true)
//!     .broker(BrokerConfig::new("guest", "guest", "localhost", "5672").queue("logs"));
//!
//! let pipeline = LogPipeline::new(config, CancellationToken::new())?;
//! pipeline.on_start().await?;
//!
//! let logger = pipeline.logger();
//! log_fanout::info!(logger, "listening on {}", 8080);
//!
//! pipeline.on_stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod appenders;
pub mod broker;
pub mod core;
pub mod events;
pub mod macros;
pub mod pipeline;

pub mod prelude {
    pub use crate::appenders::{BrokerAppender, ConsoleAppender, FileAppender, WriterAppender};
    pub use crate::broker::BrokerConfig;
    pub use crate::core::{
        Appender, FieldValue, Fields, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError,
        PipelineMetrics, Result,
    };
    pub use crate::events::{EventLogger, LifecycleEvent};
    pub use crate::pipeline::{Lifecycle, LogPipeline, PipelineConfig};
}

pub use appenders::{BrokerAppender, ConsoleAppender, FileAppender, WriterAppender};
pub use broker::{BrokerConfig, BrokerConnector, BrokerSession, Publication, RecordBuffer};
pub use core::{
    Appender, FieldValue, Fields, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError,
    PipelineMetrics, Result,
};
pub use events::{EventLogger, LifecycleEvent};
pub use pipeline::{Lifecycle, LogPipeline, PipelineConfig};
