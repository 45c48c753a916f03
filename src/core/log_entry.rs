//! Log entry structure

use super::error::Result;
use super::fields::{FieldValue, Fields};
use super::log_level::LogLevel;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::error::Error as StdError;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub fields: Fields,
    pub error: Option<String>,
}

/// Keys the record itself writes; user fields with these names are renamed
const RESERVED_KEYS: [&str; 4] = ["level", "time", "error", "message"];

/// Wire shape of a record: `level`, `time`, user fields, `error`, `message`
struct JsonRecord<'a> {
    level: LogLevel,
    time: String,
    fields: &'a Fields,
    error: Option<&'a str>,
    message: &'a str,
}

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("level", &self.level)?;
        map.serialize_entry("time", &self.time)?;
        for (key, value) in self.fields.iter() {
            if RESERVED_KEYS.contains(&key) {
                map.serialize_entry(&format!("fields.{}", key), value)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        if let Some(error) = self.error {
            map.serialize_entry("error", error)?;
        }
        if !self.message.is_empty() {
            map.serialize_entry("message", self.message)?;
        }
        map.end()
    }
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a single record can never be rendered as several lines.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            timestamp: Utc::now(),
            fields: Fields::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key, value);
        self
    }

    /// Attach an error; its display text becomes the `error` field
    #[must_use]
    pub fn with_error(mut self, err: &(dyn StdError + 'static)) -> Self {
        self.error = Some(Self::sanitize_message(&err.to_string()));
        self
    }

    #[must_use]
    pub fn with_error_message(mut self, err: impl AsRef<str>) -> Self {
        self.error = Some(Self::sanitize_message(err.as_ref()));
        self
    }

    /// RFC 3339 timestamp with second precision, UTC
    pub fn time_str(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Encode as one JSON object terminated by `\n`.
    ///
    /// This is the payload byte sinks and the broker receive.
    pub fn to_json_line(&self) -> Result<Vec<u8>> {
        let record = JsonRecord {
            level: self.level,
            time: self.time_str(),
            fields: &self.fields,
            error: self.error.as_deref(),
            message: &self.message,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Plain single-line rendering used by the file sink
    pub fn to_text(&self) -> String {
        let mut line = format!("{} {} {}", self.time_str(), self.level.abbrev(), self.message);
        if !self.fields.is_empty() {
            line.push(' ');
            line.push_str(&self.fields.to_string());
        }
        if let Some(ref err) = self.error {
            line.push_str(" error=");
            line.push_str(err);
        }
        line
    }
}
