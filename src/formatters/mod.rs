//! Formatter implementations

pub mod json;
pub mod plain;
pub mod timestamp;

pub use json::JsonFormatter;
pub use plain::PlainFormatter;
pub use timestamp::TimestampFormat;
