//! Host framework lifecycle events rendered as log records
//!
//! A dependency-injection host reports what it is doing (providing
//! constructors, running start/stop hooks, rolling back) as a stream of
//! events. [`EventLogger`] turns each one into a single record on the
//! pipeline's logger.

use crate::core::{LogEntry, LogLevel, Logger};
use std::sync::Arc;
use std::time::Duration;

/// Closed set of lifecycle events; anything else arrives as `Unknown`
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Provided {
        module_name: String,
        constructor_name: String,
        output_type_names: Vec<String>,
        err: Option<String>,
    },
    LoggerInitialized {
        constructor_name: String,
        err: Option<String>,
    },
    Invoking {
        module_name: String,
        function_name: String,
    },
    Invoked {
        module_name: String,
        function_name: String,
        trace: String,
        err: Option<String>,
    },
    OnStartExecuting {
        function_name: String,
        caller_name: String,
    },
    OnStartExecuted {
        function_name: String,
        caller_name: String,
        method: String,
        runtime: Duration,
        err: Option<String>,
    },
    Started {
        err: Option<String>,
    },
    Stopping {
        signal: String,
    },
    Stopped {
        err: Option<String>,
    },
    OnStopExecuting {
        function_name: String,
        caller_name: String,
    },
    OnStopExecuted {
        function_name: String,
        caller_name: String,
        runtime: Duration,
        err: Option<String>,
    },
    RollingBack {
        start_err: Option<String>,
    },
    RolledBack {
        err: Option<String>,
    },
    /// An event kind this adapter does not know how to format
    Unknown {
        kind: String,
    },
}

/// Formats lifecycle events onto a logger
#[derive(Clone)]
pub struct EventLogger {
    logger: Arc<Logger>,
}

impl EventLogger {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    pub fn log_event(&self, event: &LifecycleEvent) {
        self.logger.log_entry(Self::format(event));
    }

    /// Build the record for one event without writing it
    pub fn format(event: &LifecycleEvent) -> LogEntry {
        match event {
            LifecycleEvent::Provided {
                module_name,
                constructor_name,
                output_type_names,
                err,
            } => outcome(
                format!(
                    "{}::{} -> {}",
                    module_name,
                    constructor_name,
                    output_type_names.join(",")
                ),
                err,
            ),
            LifecycleEvent::LoggerInitialized {
                constructor_name,
                err,
            } => outcome(format!("logger initialized {}", constructor_name), err),
            LifecycleEvent::Invoking {
                module_name,
                function_name,
            } => LogEntry::new(
                LogLevel::Info,
                format!("{}::{} invoking", module_name, function_name),
            ),
            LifecycleEvent::Invoked {
                module_name,
                function_name,
                trace,
                err,
            } => {
                let entry = outcome(format!("{}::{} invoked", module_name, function_name), err);
                if err.is_some() && !trace.is_empty() {
                    entry.with_field("trace", trace.as_str())
                } else {
                    entry
                }
            }
            LifecycleEvent::OnStartExecuting {
                function_name,
                caller_name,
            } => LogEntry::new(
                LogLevel::Info,
                format!("{}->{} starting", function_name, caller_name),
            ),
            LifecycleEvent::OnStartExecuted {
                function_name,
                caller_name,
                method,
                runtime,
                err,
            } => outcome(
                format!(
                    "{}->{} {} {:?} started",
                    function_name, caller_name, method, runtime
                ),
                err,
            ),
            LifecycleEvent::Started { err } => match err {
                Some(err) => LogEntry::new(LogLevel::Error, "").with_error_message(err),
                None => LogEntry::new(LogLevel::Info, "application successfully initialized"),
            },
            LifecycleEvent::Stopping { signal } => LogEntry::new(
                LogLevel::Warn,
                format!("stopping application... {}", signal),
            ),
            LifecycleEvent::Stopped { err } => {
                let entry = LogEntry::new(LogLevel::Warn, "application stopped");
                match err {
                    Some(err) => entry.with_error_message(err),
                    None => entry,
                }
            }
            LifecycleEvent::OnStopExecuting {
                function_name,
                caller_name,
            } => LogEntry::new(
                LogLevel::Info,
                format!("{}->{} stopping", function_name, caller_name),
            ),
            LifecycleEvent::OnStopExecuted {
                function_name,
                caller_name,
                runtime,
                err,
            } => outcome(
                format!("{}->{} {:?} stopped", function_name, caller_name, runtime),
                err,
            ),
            LifecycleEvent::RollingBack { start_err } => outcome("rolling".to_string(), start_err),
            LifecycleEvent::RolledBack { err } => outcome("rolled".to_string(), err),
            LifecycleEvent::Unknown { kind } => {
                LogEntry::new(LogLevel::Error, "unknown event").with_field("event", kind.as_str())
            }
        }
    }
}

/// Info when the event succeeded, error with the cause attached otherwise
fn outcome(message: String, err: &Option<String>) -> LogEntry {
    match err {
        Some(err) => LogEntry::new(LogLevel::Error, message).with_error_message(err),
        None => LogEntry::new(LogLevel::Info, message),
    }
}
