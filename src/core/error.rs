//! Error types for the logging pipeline

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Dialing the broker or opening a channel failed
    #[error("Broker connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// The broker rejected a publish or the session dropped mid-publish
    #[error("Broker publish failed: {0}")]
    Publish(String),

    /// A publish did not complete within its deadline
    #[error("Broker publish timed out after {timeout_ms}ms")]
    PublishTimeout { timeout_ms: u64 },

    /// The record buffer was closed while the publisher was draining it
    #[error("Record buffer was closed")]
    BufferClosed,

    /// Lifecycle start hook invoked twice on the same pipeline
    #[error("Pipeline already started")]
    AlreadyStarted,

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a broker connection error
    pub fn connection(endpoint: impl Into<String>, message: impl ToString) -> Self {
        LoggerError::Connection {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Create a broker publish error
    pub fn publish(message: impl ToString) -> Self {
        LoggerError::Publish(message.to_string())
    }

    /// Create a publish timeout error
    pub fn publish_timeout(timeout: std::time::Duration) -> Self {
        LoggerError::PublishTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Whether the background forwarder may retry after this error.
    ///
    /// Only configuration mistakes are fatal; everything the broker path
    /// produces at runtime is retried on the next run-loop invocation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            LoggerError::InvalidConfiguration { .. } | LoggerError::AlreadyStarted
        )
    }
}
