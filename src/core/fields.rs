//! Structured key-value fields
//!
//! This module provides:
//! - `FieldValue`: the closed set of value kinds a field or argument can hold
//! - `Fields`: an immutable, shareable field set with copy-on-write overlay

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Lazily formatted value, rendered only when a formatter asks for it
#[derive(Clone)]
pub struct Stringer(Arc<dyn Fn() -> String + Send + Sync>);

impl Stringer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Stringer(Arc::new(f))
    }

    pub fn render(&self) -> String {
        (self.0)()
    }
}

impl fmt::Debug for Stringer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Stringer(..)")
    }
}

/// Value type for structured logging fields and log arguments
#[derive(Debug, Clone)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Time(DateTime<Utc>),
    Duration(Duration),
    Error(Arc<dyn std::error::Error + Send + Sync>),
    Object(BTreeMap<String, FieldValue>),
    Array(Vec<FieldValue>),
    Stringer(Stringer),
    /// Group of fields rendered under the field's key
    Namespace(Fields),
    /// Field is omitted from output
    Skip,
}

impl FieldValue {
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FieldValue::Error(Arc::new(err))
    }

    pub fn stringer<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        FieldValue::Stringer(Stringer::new(f))
    }

    /// Defer `Display` formatting of `value` until delivery
    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        FieldValue::Stringer(Stringer::new(move || value.to_string()))
    }

    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        FieldValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn array<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        FieldValue::Array(values.into_iter().map(Into::into).collect())
    }

    pub fn namespace<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        FieldValue::Namespace(Fields::new().overlay(entries))
    }

    #[inline]
    pub fn is_skip(&self) -> bool {
        matches!(self, FieldValue::Skip)
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, FieldValue::Str(_))
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::I8(i) => Value::from(*i),
            FieldValue::I16(i) => Value::from(*i),
            FieldValue::I32(i) => Value::from(*i),
            FieldValue::I64(i) => Value::from(*i),
            FieldValue::U8(u) => Value::from(*u),
            FieldValue::U16(u) => Value::from(*u),
            FieldValue::U32(u) => Value::from(*u),
            FieldValue::U64(u) => Value::from(*u),
            FieldValue::F32(f) => float_value(f64::from(*f)),
            FieldValue::F64(f) => float_value(*f),
            FieldValue::Time(t) => Value::String(format_time(t)),
            FieldValue::Duration(d) => Value::String(format!("{:?}", d)),
            FieldValue::Error(e) => Value::String(e.to_string()),
            FieldValue::Object(map) => Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_skip())
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
            FieldValue::Array(values) => Value::Array(
                values
                    .iter()
                    .filter(|v| !v.is_skip())
                    .map(FieldValue::to_json_value)
                    .collect(),
            ),
            FieldValue::Stringer(s) => Value::String(s.render()),
            FieldValue::Namespace(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
            FieldValue::Skip => Value::Null,
        }
    }
}

fn float_value(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::I8(i) => write!(f, "{}", i),
            FieldValue::I16(i) => write!(f, "{}", i),
            FieldValue::I32(i) => write!(f, "{}", i),
            FieldValue::I64(i) => write!(f, "{}", i),
            FieldValue::U8(u) => write!(f, "{}", u),
            FieldValue::U16(u) => write!(f, "{}", u),
            FieldValue::U32(u) => write!(f, "{}", u),
            FieldValue::U64(u) => write!(f, "{}", u),
            FieldValue::F32(fl) => write!(f, "{}", fl),
            FieldValue::F64(fl) => write!(f, "{}", fl),
            FieldValue::Time(t) => f.write_str(&format_time(t)),
            FieldValue::Duration(d) => write!(f, "{:?}", d),
            FieldValue::Error(e) => write!(f, "{}", e),
            FieldValue::Object(map) => {
                f.write_str("{")?;
                let mut first = true;
                for (k, v) in map.iter().filter(|(_, v)| !v.is_skip()) {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            FieldValue::Array(values) => {
                f.write_str("[")?;
                let mut first = true;
                for v in values.iter().filter(|v| !v.is_skip()) {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            FieldValue::Stringer(s) => f.write_str(&s.render()),
            FieldValue::Namespace(fields) => write!(f, "{{{}}}", fields),
            FieldValue::Skip => Ok(()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    DateTime<Utc> => Time,
    Duration => Duration,
    String => Str,
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::Str(s.clone())
    }
}

impl From<char> for FieldValue {
    fn from(c: char) -> Self {
        FieldValue::Str(c.to_string())
    }
}

impl From<isize> for FieldValue {
    fn from(i: isize) -> Self {
        FieldValue::I64(i as i64)
    }
}

impl From<usize> for FieldValue {
    fn from(u: usize) -> Self {
        FieldValue::U64(u as u64)
    }
}

impl From<Fields> for FieldValue {
    fn from(fields: Fields) -> Self {
        FieldValue::Namespace(fields)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Skip)
    }
}

type FieldMap = BTreeMap<String, FieldValue>;

/// Immutable set of structured fields.
///
/// Cloning is a reference-count bump. Deriving a child set with
/// [`Fields::overlay`] never touches the parent; when the parent is empty
/// the new entries are used as-is without copying.
///
/// # Example
///
/// ```
/// use rust_logr::Fields;
///
/// let parent = Fields::new().overlay([("service", "api")]);
/// let child = parent.overlay([("request_id", "abc-123")]);
///
/// assert_eq!(parent.len(), 1);
/// assert_eq!(child.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Fields(Option<Arc<FieldMap>>);

impl Fields {
    pub const fn new() -> Self {
        Fields(None)
    }

    /// Derive a new set holding these fields overlaid with `entries`.
    ///
    /// New keys win on collision.
    #[must_use]
    pub fn overlay<I, K, V>(&self, entries: I) -> Fields
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let added: FieldMap = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if added.is_empty() {
            return self.clone();
        }

        match &self.0 {
            None => Fields(Some(Arc::new(added))),
            Some(parent) => {
                let mut merged = FieldMap::clone(parent);
                merged.extend(added);
                Fields(Some(Arc::new(merged)))
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.as_ref().and_then(|m| m.get(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fields in key order, excluding `Skip` markers
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0
            .iter()
            .flat_map(|m| m.iter())
            .filter(|(_, v)| !v.is_skip())
    }

    /// Whether both sets share the same storage
    pub fn ptr_eq(&self, other: &Fields) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields::new().overlay(iter)
    }
}
