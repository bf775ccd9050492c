//! Delimited plain-text formatter

use super::timestamp::TimestampFormat;
use crate::core::{Formatter, Record, Result};
#[cfg(feature = "console")]
use colored::Colorize;
use std::fmt::Write as _;

/// Renders `timestamp | LEVEL | message | key=value ...` lines.
///
/// Line breaks and tabs in the message and in field values are escaped so a
/// single record always produces a single line (plus stack frames, when the
/// target asked for them).
///
/// # Example
///
/// ```
/// use rust_logr::{Fields, Formatter, Level, PlainFormatter, Record};
///
/// let formatter = PlainFormatter::new().disable_timestamp(true);
/// let fields = Fields::new().overlay([("user", "bob")]);
/// let record = Record::print(Level::INFO, fields, vec!["line1\nline2".into()]);
///
/// let mut buf = Vec::new();
/// formatter.format(&record, false, &mut buf).unwrap();
/// assert_eq!(String::from_utf8(buf).unwrap(), "INFO | line1\\nline2 | user=bob\n");
/// ```
#[derive(Debug, Clone)]
pub struct PlainFormatter {
    delimiter: String,
    timestamp_format: TimestampFormat,
    disable_timestamp: bool,
    disable_level: bool,
    disable_msg: bool,
    disable_context: bool,
    disable_stacktrace: bool,
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    use_colors: bool,
}

impl PlainFormatter {
    pub fn new() -> Self {
        Self {
            delimiter: " | ".to_string(),
            timestamp_format: TimestampFormat::default(),
            disable_timestamp: false,
            disable_level: false,
            disable_msg: false,
            disable_context: false,
            disable_stacktrace: false,
            use_colors: false,
        }
    }

    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the timestamp format
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_logr::formatters::{PlainFormatter, TimestampFormat};
    ///
    /// let formatter = PlainFormatter::new()
    ///     .timestamp_format(TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S %z".to_string()));
    /// ```
    #[must_use]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn disable_timestamp(mut self, disable: bool) -> Self {
        self.disable_timestamp = disable;
        self
    }

    #[must_use]
    pub fn disable_level(mut self, disable: bool) -> Self {
        self.disable_level = disable;
        self
    }

    #[must_use]
    pub fn disable_msg(mut self, disable: bool) -> Self {
        self.disable_msg = disable;
        self
    }

    #[must_use]
    pub fn disable_context(mut self, disable: bool) -> Self {
        self.disable_context = disable;
        self
    }

    #[must_use]
    pub fn disable_stacktrace(mut self, disable: bool) -> Self {
        self.disable_stacktrace = disable;
        self
    }

    /// Color the level name with ANSI codes
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[cfg(feature = "console")]
    fn level_text(&self, record: &Record) -> String {
        let level = record.level();
        if self.use_colors {
            level.name().color(level.color_code()).to_string()
        } else {
            level.name().to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_text(&self, record: &Record) -> String {
        record.level().name().to_string()
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for PlainFormatter {
    fn format(&self, record: &Record, stacktrace: bool, buf: &mut Vec<u8>) -> Result<()> {
        let mut parts: Vec<String> = Vec::with_capacity(4);

        if !self.disable_timestamp {
            parts.push(self.timestamp_format.format(&record.created_at()));
        }
        if !self.disable_level {
            parts.push(self.level_text(record));
        }
        if !self.disable_msg {
            parts.push(escape(record.message()));
        }
        if !self.disable_context {
            let context = record
                .fields()
                .iter()
                .map(|(k, v)| format!("{}={}", quote(&escape(k)), quote(&escape(&v.to_string()))))
                .collect::<Vec<_>>()
                .join(" ");
            if !context.is_empty() {
                parts.push(context);
            }
        }

        let mut line = parts.join(&self.delimiter);

        if stacktrace && !self.disable_stacktrace {
            for frame in record.stack().unwrap_or_default() {
                let _ = write!(line, "\n    at {}", frame.function);
                if let Some(file) = &frame.file {
                    let _ = write!(line, " ({}", file);
                    if let Some(no) = frame.line {
                        let _ = write!(line, ":{}", no);
                    }
                    line.push(')');
                }
            }
        }

        line.push('\n');
        buf.extend_from_slice(line.as_bytes());
        Ok(())
    }
}

/// Escape characters that would split one record over several lines
fn escape(text: &str) -> String {
    if !text.contains(['\n', '\r', '\t']) {
        return text.to_string();
    }
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Quote a field key or value containing spaces, quotes or `=`
fn quote(value: &str) -> String {
    if value.contains([' ', '"', '=']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Fields, Level};

    fn render(formatter: &PlainFormatter, record: &Record, stacktrace: bool) -> String {
        let mut buf = Vec::new();
        formatter.format(record, stacktrace, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_default_layout() {
        let record = Record::print(Level::WARN, Fields::new(), vec!["low disk".into()]);
        let line = render(&PlainFormatter::new(), &record, false);

        let parts: Vec<&str> = line.trim_end().split(" | ").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].ends_with('Z'));
        assert_eq!(parts[1], "WARN");
        assert_eq!(parts[2], "low disk");
    }

    #[test]
    fn test_context_fields_sorted_and_quoted() {
        let fields = Fields::new().overlay([("zone", "eu west"), ("attempt", "3")]);
        let record = Record::print(Level::INFO, fields, vec!["retry".into()]);
        let formatter = PlainFormatter::new().disable_timestamp(true);

        assert_eq!(
            render(&formatter, &record, false),
            "INFO | retry | attempt=3 zone=\"eu west\"\n"
        );
    }

    #[test]
    fn test_toggles_and_delimiter() {
        let fields = Fields::new().overlay([("k", 1)]);
        let record = Record::print(Level::ERROR, fields, vec!["boom".into()]);
        let formatter = PlainFormatter::new()
            .disable_timestamp(true)
            .disable_context(true)
            .delimiter(" - ");

        assert_eq!(render(&formatter, &record, false), "ERROR - boom\n");
    }

    #[test]
    fn test_log_injection_prevention() {
        let record = Record::print(
            Level::INFO,
            Fields::new(),
            vec!["ok\nERROR | forged\r\tline".into()],
        );
        let line = render(&PlainFormatter::new().disable_timestamp(true), &record, false);

        assert_eq!(line, "INFO | ok\\nERROR | forged\\r\\tline\n");
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_field_keys_are_escaped() {
        let fields = Fields::new().overlay([("user\n2025-01-01T00:00:00.000Z | ERROR | forged", "bob")]);
        let record = Record::print(Level::INFO, fields, vec!["login".into()]);
        let line = render(&PlainFormatter::new().disable_timestamp(true), &record, false);

        assert_eq!(
            line,
            "INFO | login | \"user\\\\n2025-01-01T00:00:00.000Z | ERROR | forged\"=bob\n"
        );
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_stacktrace_only_when_requested() {
        let record = Record::print(Level::PANIC, Fields::new(), vec!["x".into()]).with_captured_stack();
        let formatter = PlainFormatter::new().disable_timestamp(true);

        assert_eq!(render(&formatter, &record, false), "PANIC | x\n");
        let with_stack = render(&formatter, &record, true);
        assert!(with_stack.starts_with("PANIC | x"));
        if !record.stack().unwrap_or_default().is_empty() {
            assert!(with_stack.contains("\n    at "));
        }

        let disabled = formatter.disable_stacktrace(true);
        assert_eq!(render(&disabled, &record, true), "PANIC | x\n");
    }
}
