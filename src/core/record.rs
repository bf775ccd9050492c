//! Log record structure

use super::fields::{FieldValue, Fields};
use super::level::Level;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt::Write as _;
use std::sync::OnceLock;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Frame prefixes belonging to backtrace machinery or this pipeline
const INTERNAL_FRAMES: &[&str] = &[
    "std::backtrace",
    "rust_logr::core::record::",
    "rust_logr::core::logger::",
    "rust_logr::core::logr::",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Capture the caller's stack, excluding the pipeline's own frames
pub fn capture_stack() -> Vec<StackFrame> {
    parse_backtrace(&Backtrace::force_capture().to_string())
}

fn parse_backtrace(rendered: &str) -> Vec<StackFrame> {
    let mut frames: Vec<StackFrame> = Vec::new();
    for line in rendered.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_none() {
                    let (file, line) = split_location(location);
                    frame.file = Some(file);
                    frame.line = line;
                }
            }
            continue;
        }
        let Some((index, function)) = line.split_once(": ") else {
            continue;
        };
        if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
            frames.push(StackFrame {
                function: function.to_string(),
                file: None,
                line: None,
            });
        }
    }
    frames.retain(|f| !INTERNAL_FRAMES.iter().any(|p| f.function.starts_with(p)));
    frames
}

/// Split `path:line:column` into the path and line number
fn split_location(location: &str) -> (String, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let column = parts.next();
    let line = parts.next();
    match (parts.next(), line, column) {
        (Some(path), Some(line), Some(_)) => (path.to_string(), line.parse().ok()),
        _ => (location.to_string(), None),
    }
}

/// Immutable snapshot of one logging event.
///
/// The message is not rendered at construction; [`Record::message`] renders
/// it on first use and caches the result for every later reader.
#[derive(Debug)]
pub struct Record {
    level: Level,
    fields: Fields,
    template: Option<String>,
    args: Vec<FieldValue>,
    newline: bool,
    created_at: DateTime<Utc>,
    thread_id: String,
    thread_name: Option<String>,
    stack: Option<Vec<StackFrame>>,
    message: OnceLock<String>,
}

impl Record {
    fn new(
        level: Level,
        fields: Fields,
        template: Option<String>,
        args: Vec<FieldValue>,
        newline: bool,
    ) -> Self {
        Self {
            level,
            fields,
            template,
            args,
            newline,
            created_at: Utc::now(),
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            stack: None,
            message: OnceLock::new(),
        }
    }

    /// Print style: operands concatenated, spaced when neither is a string
    pub fn print(level: Level, fields: Fields, args: Vec<FieldValue>) -> Self {
        Self::new(level, fields, None, args, false)
    }

    /// Template style: `{}` placeholders filled from `args` in order
    pub fn templated(
        level: Level,
        fields: Fields,
        template: impl Into<String>,
        args: Vec<FieldValue>,
    ) -> Self {
        Self::new(level, fields, Some(template.into()), args, false)
    }

    /// Line style: operands always joined by single spaces
    pub fn line(level: Level, fields: Fields, args: Vec<FieldValue>) -> Self {
        Self::new(level, fields, None, args, true)
    }

    /// Capture the current stack into this record
    #[must_use]
    pub fn with_captured_stack(mut self) -> Self {
        self.stack = Some(capture_stack());
        self
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    #[inline]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn args(&self) -> &[FieldValue] {
        &self.args
    }

    #[inline]
    pub fn is_newline(&self) -> bool {
        self.newline
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    pub fn stack(&self) -> Option<&[StackFrame]> {
        self.stack.as_deref()
    }

    /// Rendered message, computed once
    pub fn message(&self) -> &str {
        self.message.get_or_init(|| match &self.template {
            Some(template) => render_template(template, &self.args),
            None if self.newline => render_line(&self.args),
            None => render_print(&self.args),
        })
    }
}

fn render_print(args: &[FieldValue]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !arg.is_string() && !args[i - 1].is_string() {
            out.push(' ');
        }
        let _ = write!(out, "{}", arg);
    }
    out
}

fn render_line(args: &[FieldValue]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_template(template: &str, args: &[FieldValue]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                match remaining.next() {
                    Some(arg) => {
                        let _ = write!(out, "{}", arg);
                    }
                    None => out.push_str("{!MISSING}"),
                }
            }
            _ => out.push(c),
        }
    }

    let extra: Vec<String> = remaining.map(ToString::to_string).collect();
    if !extra.is_empty() {
        let _ = write!(out, " {{!EXTRA {}}}", extra.join(", "));
    }
    out
}
