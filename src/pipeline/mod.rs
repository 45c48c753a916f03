//! Pipeline assembly and the broker forwarding orchestrator
//!
//! [`LogPipeline`] is built once from a [`PipelineConfig`], owns the shared
//! [`Logger`], and, when broker forwarding is configured, exactly one
//! background task that keeps calling [`BrokerPublisher::run`] until the
//! pipeline's cancellation token fires.

pub mod config;
pub mod lifecycle;

pub use config::PipelineConfig;
pub use lifecycle::Lifecycle;

use crate::appenders::{
    BrokerAppender, ConsoleAppender, FileAppender, WriterAppender, BROKER_APPENDER_NAME,
};
use crate::broker::{BrokerConnector, BrokerPublisher, RecordBuffer};
use crate::core::{LogEntry, LogLevel, Logger, LoggerError, PipelineMetrics, Result};
use crate::events::EventLogger;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const START_BANNER: &str = "=================== START ===================";

/// Message of the record written when a forwarding cycle fails
pub const FORWARDING_FAILED: &str = "broker log forwarding failed";

struct Forwarder {
    publisher: Arc<BrokerPublisher>,
    buffer: Arc<RecordBuffer>,
    retry_delay: Duration,
}

pub struct LogPipeline {
    logger: Arc<Logger>,
    forwarder: Option<Forwarder>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl LogPipeline {
    /// Build a pipeline using the AMQP connector for broker forwarding.
    ///
    /// `cancel` is the host application's shutdown signal. The pipeline
    /// works on a child token so `on_stop` can end forwarding on its own.
    ///
    /// # Errors
    ///
    /// Fails before anything is spawned when the broker configuration has
    /// neither a queue nor an exchange, or is otherwise invalid.
    pub fn new(config: PipelineConfig, cancel: CancellationToken) -> Result<Self> {
        #[cfg(feature = "amqp")]
        let connector: Option<Arc<dyn BrokerConnector>> =
            Some(Arc::new(crate::broker::AmqpConnector::new()));
        #[cfg(not(feature = "amqp"))]
        let connector: Option<Arc<dyn BrokerConnector>> = None;

        Self::build(config, cancel, connector)
    }

    /// Build a pipeline that reaches the broker through `connector`
    pub fn with_connector(
        config: PipelineConfig,
        cancel: CancellationToken,
        connector: Arc<dyn BrokerConnector>,
    ) -> Result<Self> {
        Self::build(config, cancel, Some(connector))
    }

    fn build(
        config: PipelineConfig,
        cancel: CancellationToken,
        connector: Option<Arc<dyn BrokerConnector>>,
    ) -> Result<Self> {
        let broker = match config.log_to_broker {
            Some(ref broker) => Some(broker.resolve()?),
            None => None,
        };
        let connector = match (&broker, connector) {
            (Some(_), None) => {
                return Err(LoggerError::config(
                    "PipelineConfig",
                    "broker forwarding needs the `amqp` feature or a custom connector",
                ))
            }
            (_, connector) => connector,
        };

        // A supplied instance keeps its level and metrics; its outputs are
        // replaced by the sinks selected here.
        let logger = match config.own_instance {
            Some(logger) => {
                logger.clear_appenders();
                logger
            }
            None => {
                let logger = Logger::new();
                logger.set_min_level(LogLevel::Trace);
                logger
            }
        };
        if let Some(level) = config.min_level {
            logger.set_min_level(level);
        }
        let metrics = logger.shared_metrics();

        if config.log_to_console {
            logger.add_appender(Box::new(ConsoleAppender::new()));
        }
        if let Some(file) = config.log_to_file {
            logger.add_appender(Box::new(FileAppender::from_file(file)));
        }

        let forwarder = match (broker, connector) {
            (Some(broker), Some(connector)) => {
                let buffer = Arc::new(RecordBuffer::new(broker.buffer_capacity()));
                logger.add_appender(Box::new(BrokerAppender::new(
                    Arc::clone(&buffer),
                    Arc::clone(&metrics),
                )));
                let retry_delay = broker.retry_delay();
                let publisher =
                    BrokerPublisher::new(broker, Arc::clone(&buffer), connector, metrics);
                Some(Forwarder {
                    publisher: Arc::new(publisher),
                    buffer,
                    retry_delay,
                })
            }
            _ => None,
        };

        for (idx, writer) in config.custom_writers.into_iter().enumerate() {
            logger.add_appender(Box::new(WriterAppender::named(
                format!("custom-{}", idx),
                writer,
            )));
        }

        Ok(Self {
            logger: Arc::new(logger),
            forwarder,
            cancel: cancel.child_token(),
            task: Mutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    /// The shared logger every call site writes through
    pub fn logger(&self) -> Arc<Logger> {
        Arc::clone(&self.logger)
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        self.logger.metrics()
    }

    /// Adapter that writes host lifecycle events to this pipeline
    pub fn event_logger(&self) -> EventLogger {
        EventLogger::new(self.logger())
    }

    /// The broker buffer, if broker forwarding is configured
    pub fn buffer(&self) -> Option<&Arc<RecordBuffer>> {
        self.forwarder.as_ref().map(|f| &f.buffer)
    }

    /// Byte-stream writer feeding the broker buffer directly
    pub fn broker_writer(&self) -> Option<BrokerAppender> {
        self.forwarder.as_ref().map(|f| {
            BrokerAppender::new(Arc::clone(&f.buffer), self.logger.shared_metrics())
        })
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the forwarding task is alive
    pub fn is_forwarding(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

#[async_trait]
impl Lifecycle for LogPipeline {
    async fn on_start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(LoggerError::AlreadyStarted);
        }

        self.logger.info(START_BANNER);

        if let Some(ref forwarder) = self.forwarder {
            let handle = tokio::spawn(forward(
                Arc::clone(&forwarder.publisher),
                Arc::clone(&self.logger),
                self.cancel.clone(),
                forwarder.retry_delay,
            ));
            *self.task.lock() = Some(handle);
        }
        Ok(())
    }

    async fn on_stop(&self) -> Result<()> {
        self.cancel.cancel();

        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                self.logger.log_entry_excluding(
                    LogEntry::new(LogLevel::Error, "broker forwarder task failed")
                        .with_error_message(e.to_string()),
                    &[BROKER_APPENDER_NAME],
                );
            }
        }

        self.logger.flush()
    }
}

impl Drop for LogPipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Retry loop run by the background task.
///
/// Failures are written to every sink except the broker one; the loop
/// exits once `cancel` fires, including during the retry pause.
async fn forward(
    publisher: Arc<BrokerPublisher>,
    logger: Arc<Logger>,
    cancel: CancellationToken,
    retry_delay: Duration,
) {
    loop {
        if let Err(e) = publisher.run(&cancel).await {
            logger.metrics().record_failed_run();
            logger.log_entry_excluding(
                LogEntry::new(LogLevel::Error, FORWARDING_FAILED)
                    .with_field("endpoint", publisher.config().endpoint())
                    .with_error(&e),
                &[BROKER_APPENDER_NAME],
            );
            if !e.is_recoverable() {
                break;
            }
        }

        if cancel.is_cancelled() {
            break;
        }

        if retry_delay.is_zero() {
            tokio::task::yield_now().await;
            continue;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(retry_delay) => {}
        }
    }
    tracing::debug!(endpoint = %publisher.config().endpoint(), "broker forwarder stopped");
}
