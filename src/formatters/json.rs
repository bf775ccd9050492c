//! JSON formatter for structured logging
//!
//! Writes one JSON object per line (JSONL), compatible with log aggregation
//! tools like ELK or Loki.

use super::timestamp::TimestampFormat;
use crate::core::{Formatter, Record, Result};
use serde::ser::{SerializeMap, Serializer};

/// Renders records as single-line JSON objects.
///
/// Output keys appear in a fixed order: timestamp, level, message, the
/// context fields sorted by key, then the stack trace. A context key equal
/// to one of the reserved keys is prefixed with `_` until it is unique.
///
/// # Example
///
/// ```
/// use rust_logr::{Fields, Formatter, JsonFormatter, Level, Record};
///
/// let formatter = JsonFormatter::new().disable_timestamp(true);
/// let fields = Fields::new().overlay([("msg", "shadowed"), ("user", "bob")]);
/// let record = Record::print(Level::INFO, fields, vec!["logged in".into()]);
///
/// let mut buf = Vec::new();
/// formatter.format(&record, false, &mut buf).unwrap();
/// assert_eq!(
///     String::from_utf8(buf).unwrap(),
///     "{\"level\":\"INFO\",\"msg\":\"logged in\",\"_msg\":\"shadowed\",\"user\":\"bob\"}\n"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    timestamp_format: TimestampFormat,
    disable_timestamp: bool,
    disable_level: bool,
    disable_msg: bool,
    disable_context: bool,
    disable_stacktrace: bool,
    key_timestamp: String,
    key_level: String,
    key_msg: String,
    key_stacktrace: String,
    key_context_fields: Option<String>,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            timestamp_format: TimestampFormat::default(),
            disable_timestamp: false,
            disable_level: false,
            disable_msg: false,
            disable_context: false,
            disable_stacktrace: false,
            key_timestamp: "timestamp".to_string(),
            key_level: "level".to_string(),
            key_msg: "msg".to_string(),
            key_stacktrace: "stacktrace".to_string(),
            key_context_fields: None,
        }
    }

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

    #[must_use]
    pub fn key_timestamp(mut self, key: impl Into<String>) -> Self {
        self.key_timestamp = key.into();
        self
    }

    #[must_use]
    pub fn key_level(mut self, key: impl Into<String>) -> Self {
        self.key_level = key.into();
        self
    }

    #[must_use]
    pub fn key_msg(mut self, key: impl Into<String>) -> Self {
        self.key_msg = key.into();
        self
    }

    #[must_use]
    pub fn key_stacktrace(mut self, key: impl Into<String>) -> Self {
        self.key_stacktrace = key.into();
        self
    }

    /// Group all context fields in one object under `key`
    #[must_use]
    pub fn key_context_fields(mut self, key: impl Into<String>) -> Self {
        self.key_context_fields = Some(key.into());
        self
    }

    fn is_reserved(&self, key: &str) -> bool {
        key == self.key_timestamp
            || key == self.key_level
            || key == self.key_msg
            || key == self.key_stacktrace
    }

    fn unique_key(&self, key: &str) -> String {
        let mut key = key.to_string();
        while self.is_reserved(&key) {
            key.insert(0, '_');
        }
        key
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record, stacktrace: bool, buf: &mut Vec<u8>) -> Result<()> {
        let mut ser = serde_json::Serializer::new(&mut *buf);
        let mut map = ser.serialize_map(None)?;

        if !self.disable_timestamp {
            let created_at = record.created_at();
            if self.timestamp_format.is_numeric() {
                map.serialize_entry(&self.key_timestamp, &created_at.timestamp_millis())?;
            } else {
                map.serialize_entry(&self.key_timestamp, &self.timestamp_format.format(&created_at))?;
            }
        }
        if !self.disable_level {
            map.serialize_entry(&self.key_level, record.level().name())?;
        }
        if !self.disable_msg {
            map.serialize_entry(&self.key_msg, record.message())?;
        }
        if !self.disable_context {
            match &self.key_context_fields {
                Some(group) => {
                    let grouped: serde_json::Map<String, serde_json::Value> = record
                        .fields()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json_value()))
                        .collect();
                    map.serialize_entry(group, &grouped)?;
                }
                None => {
                    for (key, value) in record.fields().iter() {
                        map.serialize_entry(&self.unique_key(key), value)?;
                    }
                }
            }
        }
        if stacktrace && !self.disable_stacktrace {
            if let Some(frames) = record.stack().filter(|f| !f.is_empty()) {
                map.serialize_entry(&self.key_stacktrace, frames)?;
            }
        }

        map.end()?;
        buf.push(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, Fields, Level};
    use serde_json::Value;

    fn render(formatter: &JsonFormatter, record: &Record, stacktrace: bool) -> Value {
        let mut buf = Vec::new();
        formatter.format(record, stacktrace, &mut buf).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn test_basic_object() {
        let fields = Fields::new().overlay([("user_id", FieldValue::from(123)), ("ok", true.into())]);
        let record = Record::print(Level::WARN, fields, vec!["User logged in".into()]);
        let json = render(&JsonFormatter::new(), &record, false);

        assert!(json["timestamp"].is_string());
        assert_eq!(json["level"], "WARN");
        assert_eq!(json["msg"], "User logged in");
        assert_eq!(json["user_id"], 123);
        assert_eq!(json["ok"], true);
        assert!(json.get("stacktrace").is_none());
    }

    #[test]
    fn test_collisions_prefixed_until_unique() {
        let fields = Fields::new().overlay([("level", "custom"), ("_level", "taken")]);
        let record = Record::print(Level::INFO, fields, vec!["x".into()]);
        let json = render(&JsonFormatter::new().key_level("_level"), &record, false);

        // Only the context key equal to a reserved key moves
        assert_eq!(json["_level"], "INFO");
        assert_eq!(json["level"], "custom");
        assert_eq!(json["__level"], "taken");
    }

    #[test]
    fn test_grouped_context_fields() {
        let fields = Fields::new().overlay([("b", 2), ("a", 1)]);
        let record = Record::print(Level::INFO, fields, vec!["grouped".into()]);
        let json = render(&JsonFormatter::new().key_context_fields("ctx"), &record, false);

        assert_eq!(json["ctx"], serde_json::json!({"a": 1, "b": 2}));
        assert!(json.get("a").is_none());
    }

    #[test]
    fn test_custom_keys_and_unix_timestamp() {
        let record = Record::print(Level::ERROR, Fields::new(), vec!["boom".into()]);
        let formatter = JsonFormatter::new()
            .key_msg("message")
            .key_timestamp("ts")
            .timestamp_format(TimestampFormat::UnixMillis);
        let json = render(&formatter, &record, false);

        assert_eq!(json["message"], "boom");
        assert!(json["ts"].is_i64());
    }

    #[test]
    fn test_skip_fields_omitted() {
        let fields = Fields::new().overlay([("gone", FieldValue::Skip), ("kept", "yes".into())]);
        let record = Record::print(Level::INFO, fields, vec![]);
        let json = render(&JsonFormatter::new(), &record, false);

        assert!(json.get("gone").is_none());
        assert_eq!(json["kept"], "yes");
    }

    #[test]
    fn test_stacktrace_frames() {
        let record = Record::print(Level::PANIC, Fields::new(), vec!["p".into()]).with_captured_stack();
        let json = render(&JsonFormatter::new(), &record, true);

        if let Some(frames) = json.get("stacktrace") {
            let first = &frames[0];
            assert!(first["function"].is_string());
            assert!(first.get("file").is_some());
            assert!(first.get("line").is_some());
        }

        let hidden = render(&JsonFormatter::new(), &record, false);
        assert!(hidden.get("stacktrace").is_none());
    }
}
