//! Console appender implementation

use crate::core::{Appender, LogEntry, Result};
use std::io::Write;

#[cfg(feature = "console")]
use colored::Colorize;

/// Human-readable records on stdout.
///
/// Layout: `<RFC 3339 time> <LVL> <message> key=value ... error=<err>`.
/// Colors require the `console` feature and can be switched off.
pub struct ConsoleAppender {
    use_colors: bool,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors: use_colors && cfg!(feature = "console"),
        }
    }

    pub fn uses_colors(&self) -> bool {
        self.use_colors
    }

    #[cfg(feature = "console")]
    fn format_colored(&self, entry: &LogEntry) -> String {
        let mut line = format!(
            "{} {} {}",
            entry.time_str().dimmed(),
            entry.level.abbrev().color(entry.level.color_code()).bold(),
            entry.message
        );
        for (key, value) in entry.fields.iter() {
            line.push_str(&format!(" {}{}", format!("{}=", key).cyan(), value));
        }
        if let Some(ref err) = entry.error {
            line.push_str(&format!(" {}{}", "error=".red(), err.red()));
        }
        line
    }

    fn format(&self, entry: &LogEntry) -> String {
        #[cfg(feature = "console")]
        if self.use_colors {
            return self.format_colored(entry);
        }
        entry.to_text()
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let line = self.format(entry);
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
