//! Broker forwarding: bounded buffer, publisher and the client seam
//!
//! Producers enqueue formatted records into a [`RecordBuffer`]; a single
//! background task owned by the pipeline drives a [`BrokerPublisher`] that
//! drains the buffer into the broker through a [`BrokerConnector`].

pub mod buffer;
pub mod config;
pub mod publisher;
pub mod session;

#[cfg(feature = "amqp")]
pub mod amqp;

pub use buffer::{Dequeued, RecordBuffer};
pub use config::{
    BrokerConfig, ResolvedBrokerConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_CONTENT_TYPE,
    DEFAULT_PUBLISH_TIMEOUT, DEFAULT_RETRY_DELAY,
};
pub use publisher::BrokerPublisher;
pub use session::{BrokerConnector, BrokerSession, Publication};

#[cfg(feature = "amqp")]
pub use amqp::AmqpConnector;
