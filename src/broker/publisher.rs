//! Broker publisher: one connect → drain → disconnect cycle per call
//!
//! The publisher never retries on its own. Every error ends the current
//! invocation after the session has been closed; the orchestrator decides
//! when to call [`BrokerPublisher::run`] again.

use super::buffer::{Dequeued, RecordBuffer};
use super::config::ResolvedBrokerConfig;
use super::session::{BrokerConnector, BrokerSession, Publication};
use crate::core::{LoggerError, PipelineMetrics, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct BrokerPublisher {
    config: ResolvedBrokerConfig,
    buffer: Arc<RecordBuffer>,
    connector: Arc<dyn BrokerConnector>,
    metrics: Arc<PipelineMetrics>,
}

impl BrokerPublisher {
    pub fn new(
        config: ResolvedBrokerConfig,
        buffer: Arc<RecordBuffer>,
        connector: Arc<dyn BrokerConnector>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            config,
            buffer,
            connector,
            metrics,
        }
    }

    pub fn config(&self) -> &ResolvedBrokerConfig {
        &self.config
    }

    /// Run one invocation until cancellation (`Ok`) or the first error.
    ///
    /// Cancellation is honored while connecting, before each dequeue, while
    /// waiting on the buffer and during a publish.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        let mut session = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            session = self.connector.connect(&self.config) => session?,
        };

        let result = self.publish_loop(session.as_mut(), cancel).await;

        if let Err(e) = session.close().await {
            tracing::debug!(endpoint = %self.config.endpoint(), error = %e, "closing broker session failed");
        }
        result
    }

    async fn publish_loop(
        &self,
        session: &mut dyn BrokerSession,
        cancel: &CancellationToken,
    ) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let payload = match self.buffer.dequeue(cancel).await {
                Dequeued::Payload(payload) => payload,
                Dequeued::Cancelled => return Ok(()),
                Dequeued::Closed => return Err(LoggerError::BufferClosed),
            };

            if payload.is_empty() {
                continue;
            }

            let publication = Publication {
                exchange: self.config.exchange(),
                routing_key: self.config.routing_key(),
                content_type: self.config.content_type(),
                body: &payload,
            };
            let timeout = self.config.publish_timeout();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                outcome = tokio::time::timeout(timeout, session.publish(publication)) => {
                    match outcome {
                        Ok(Ok(())) => {
                            self.metrics.record_published();
                        }
                        Ok(Err(e)) => return Err(e),
                        Err(_elapsed) => return Err(LoggerError::publish_timeout(timeout)),
                    }
                }
            }
        }
    }
}
