//! Appender implementations

pub mod broker;
pub mod console;
pub mod file;
pub mod writer;

pub use broker::{BrokerAppender, BROKER_APPENDER_NAME};
pub use console::ConsoleAppender;
pub use file::FileAppender;
pub use writer::WriterAppender;

pub use crate::core::Appender;
