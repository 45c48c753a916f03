//! Seam between the publisher and a concrete broker client

use super::config::ResolvedBrokerConfig;
use crate::core::Result;
use async_trait::async_trait;

/// One message as it goes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Publication<'a> {
    pub exchange: &'a str,
    pub routing_key: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
}

/// Opens a connection plus publishing channel for one run-loop invocation
///
/// # Example
///
/// ```no_run
/// use log_fanout::broker::{BrokerConnector, BrokerSession, Publication, ResolvedBrokerConfig};
/// use log_fanout::Result;
/// use async_trait::async_trait;
///
/// struct StdoutSession;
///
/// #[async_trait]
/// impl BrokerSession for StdoutSession {
///     async fn publish(&mut self, publication: Publication<'_>) -> Result<()> {
///         println!("{}", String::from_utf8_lossy(publication.body));
///         Ok(())
///     }
///
///     async fn close(self: Box<Self>) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// struct StdoutConnector;
///
/// #[async_trait]
/// impl BrokerConnector for StdoutConnector {
///     async fn connect(&self, _config: &ResolvedBrokerConfig) -> Result<Box<dyn BrokerSession>> {
///         Ok(Box::new(StdoutSession))
///     }
/// }
/// ```
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(&self, config: &ResolvedBrokerConfig) -> Result<Box<dyn BrokerSession>>;
}

/// A live connection and channel, owned by exactly one publisher invocation
#[async_trait]
pub trait BrokerSession: Send {
    /// Hand one message to the broker. Fire-and-forget: success means the
    /// client accepted it, not that the broker acknowledged it.
    async fn publish(&mut self, publication: Publication<'_>) -> Result<()>;

    /// Release channel and connection
    async fn close(self: Box<Self>) -> Result<()>;
}
