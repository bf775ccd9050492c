//! Front-end logger bound to a dispatcher and a field set

use super::{
    fields::{FieldValue, Fields},
    level::Level,
    logr::Logr,
    record::Record,
};
use std::fmt;
use std::sync::Arc;

/// Exit code passed to the exit path by fatal records
pub const FATAL_EXIT_CODE: i32 = 1;

/// Handle for emitting records.
///
/// Cloning is cheap: a logger is a dispatcher reference plus an immutable,
/// shared field set. Deriving a child with [`Logger::with_field`] never
/// changes the parent.
///
/// Every logging method comes in three styles:
///
/// - print (`info`): operands concatenated, spaced when neither is a string
/// - template (`infof`): `{}` placeholders filled in order
/// - line (`infoln`): operands joined by single spaces
///
/// # Example
///
/// ```
/// use rust_logr::prelude::*;
/// use rust_logr::writers::MemoryWriter;
/// use std::time::Duration;
///
/// let memory = MemoryWriter::new();
/// let logr = Logr::builder()
///     .target(
///         Target::builder("memory")
///             .filter(Filter::all())
///             .formatter(PlainFormatter::new().disable_timestamp(true))
///             .writer(memory.clone())
///             .build()
///             .unwrap(),
///     )
///     .build()
///     .unwrap();
///
/// let logger = logr.new_logger().with_field("user", "bob");
/// logger.infof("login took {}ms", args![42]);
/// logger.warnln(args!["retrying", 3, "times"]);
///
/// logr.shutdown(Duration::from_secs(1));
/// assert_eq!(
///     memory.lines(),
///     ["INFO | login took 42ms | user=bob", "WARN | retrying 3 times | user=bob"]
/// );
/// ```
#[derive(Clone)]
pub struct Logger {
    logr: Arc<Logr>,
    fields: Fields,
}

macro_rules! level_methods {
    ($($level:ident => $print:ident, $template:ident, $line:ident;)*) => {
        $(
            #[doc = concat!("Log at ", stringify!($level), ", print style")]
            #[inline]
            pub fn $print(&self, args: Vec<FieldValue>) {
                self.log(Level::$level, args)
            }

            #[doc = concat!("Log at ", stringify!($level), ", template style")]
            #[inline]
            pub fn $template(&self, template: &str, args: Vec<FieldValue>) {
                self.logf(Level::$level, template, args)
            }

            #[doc = concat!("Log at ", stringify!($level), ", line style")]
            #[inline]
            pub fn $line(&self, args: Vec<FieldValue>) {
                self.logln(Level::$level, args)
            }
        )*
    };
}

impl Logger {
    pub fn new(logr: Arc<Logr>) -> Self {
        Self {
            logr,
            fields: Fields::new(),
        }
    }

    pub fn logr(&self) -> &Arc<Logr> {
        &self.logr
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Child logger carrying one more field
    #[must_use]
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Logger {
        self.with_fields([(key, value)])
    }

    /// Child logger carrying more fields; new keys win on collision
    #[must_use]
    pub fn with_fields<I, K, V>(&self, entries: I) -> Logger
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Logger {
            logr: Arc::clone(&self.logr),
            fields: self.fields.overlay(entries),
        }
    }

    /// Whether any target wants records at `level`
    pub fn is_enabled(&self, level: Level) -> bool {
        self.logr.is_level_enabled(&level).enabled
    }

    pub fn log(&self, level: Level, args: Vec<FieldValue>) {
        if let Some(stacktrace) = self.prepare(&level) {
            self.submit(Record::print(level, self.fields.clone(), args), stacktrace);
        }
    }

    pub fn logf(&self, level: Level, template: &str, args: Vec<FieldValue>) {
        if let Some(stacktrace) = self.prepare(&level) {
            let record = Record::templated(level, self.fields.clone(), template, args);
            self.submit(record, stacktrace);
        }
    }

    pub fn logln(&self, level: Level, args: Vec<FieldValue>) {
        if let Some(stacktrace) = self.prepare(&level) {
            self.submit(Record::line(level, self.fields.clone(), args), stacktrace);
        }
    }

    level_methods! {
        TRACE => trace, tracef, traceln;
        DEBUG => debug, debugf, debugln;
        INFO => info, infof, infoln;
        INFO => print, printf, println;
        WARN => warn, warnf, warnln;
        ERROR => error, errorf, errorln;
    }

    /// Log at FATAL, then take the exit path of the dispatcher
    pub fn fatal(&self, args: Vec<FieldValue>) {
        self.log(Level::FATAL, args);
        self.logr.exit(FATAL_EXIT_CODE);
    }

    pub fn fatalf(&self, template: &str, args: Vec<FieldValue>) {
        self.logf(Level::FATAL, template, args);
        self.logr.exit(FATAL_EXIT_CODE);
    }

    pub fn fatalln(&self, args: Vec<FieldValue>) {
        self.logln(Level::FATAL, args);
        self.logr.exit(FATAL_EXIT_CODE);
    }

    /// Log at PANIC and hand the escalation back to the caller.
    ///
    /// ```should_panic
    /// # use rust_logr::prelude::*;
    /// # let logr = Logr::builder().build().unwrap();
    /// # let logger = logr.new_logger();
    /// logger.panic(args!["invariant broken"]).raise();
    /// ```
    pub fn panic(&self, args: Vec<FieldValue>) -> Escalation {
        let stacktrace = self.prepare(&Level::PANIC);
        self.escalate(Record::print(Level::PANIC, self.fields.clone(), args), stacktrace)
    }

    pub fn panicf(&self, template: &str, args: Vec<FieldValue>) -> Escalation {
        let stacktrace = self.prepare(&Level::PANIC);
        let record = Record::templated(Level::PANIC, self.fields.clone(), template, args);
        self.escalate(record, stacktrace)
    }

    pub fn panicln(&self, args: Vec<FieldValue>) -> Escalation {
        let stacktrace = self.prepare(&Level::PANIC);
        self.escalate(Record::line(Level::PANIC, self.fields.clone(), args), stacktrace)
    }

    /// Stack decision for `level`, or `None` when no target wants it.
    ///
    /// A level no filter can evaluate is reported here when it also enables
    /// nothing; otherwise the dispatcher reports it while routing.
    fn prepare(&self, level: &Level) -> Option<bool> {
        let (status, error) = self.logr.check_level(level);
        if status.enabled {
            return Some(status.stacktrace);
        }
        if let Some(err) = error {
            self.logr.report(err);
        }
        None
    }

    fn submit(&self, record: Record, stacktrace: bool) {
        let record = if stacktrace {
            record.with_captured_stack()
        } else {
            record
        };
        self.logr.enqueue(record);
    }

    fn escalate(&self, record: Record, stacktrace: Option<bool>) -> Escalation {
        let message = record.message().to_string();
        if let Some(stacktrace) = stacktrace {
            self.submit(record, stacktrace);
        }
        Escalation { message }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// A PANIC record that has been logged and now awaits the caller's decision
#[must_use = "call raise() to panic or dismiss() to continue"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalation {
    message: String,
}

impl Escalation {
    /// Rendered message of the record
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Panic with the record's message
    pub fn raise(self) -> ! {
        panic!("{}", self.message)
    }

    /// Continue without panicking
    pub fn dismiss(self) {}
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
