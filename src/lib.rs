//! # Rust Logr
//!
//! A structured logging pipeline with per-target queues and workers.
//!
//! ## Features
//!
//! - **Never blocks producers**: each target has a bounded queue; a full
//!   queue drops the record for that target and reports it
//! - **Per-target routing**: threshold or explicit level filters, each with
//!   its own stack trace policy
//! - **Fault isolation**: formatter and writer failures, panics included,
//!   are reported through an error hook and never reach the caller
//! - **Bounded shutdown**: drains every target up to a deadline and reports
//!   what was abandoned
//!
//! ## Quick start
//!
//! ```
//! use rust_logr::prelude::*;
//! use rust_logr::writers::ConsoleWriter;
//! use std::time::Duration;
//!
//! let logr = Logr::builder()
//!     .on_error(stderr_hook())
//!     .target(
//!         Target::builder("console")
//!             .filter(Filter::threshold(Level::INFO, Level::PANIC))
//!             .formatter(PlainFormatter::new())
//!             .writer(ConsoleWriter::stdout())
//!             .build()
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let logger = logr.new_logger().with_field("service", "api");
//! info!(logger, "listening on port ", 8080);
//! warnf!(logger, "{} connections dropped", 3);
//!
//! logr.shutdown(Duration::from_secs(1));
//! ```

pub mod core;
pub mod formatters;
pub mod macros;
pub mod writers;

pub mod prelude {
    pub use crate::core::{
        stderr_hook, DrainOutcome, ErrorCategory, ErrorHook, Escalation, ExitHook,
        ExplicitFilter, FieldValue, Fields, Filter, Formatter, Level, LevelStatus, Logger,
        LoggerError, Logr, LogrBuilder, LogrConfig, LogrState, Offer, OverflowPolicy, Record,
        Result, ShutdownReport, Target, TargetBuilder, Writer, CUSTOM_LEVEL_MIN,
        DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT, FATAL_EXIT_CODE, MAX_LEVEL_ID,
    };
    pub use crate::formatters::{JsonFormatter, PlainFormatter, TimestampFormat};
    pub use crate::{
        args, debug, debugf, debugln, error, errorf, errorln, info, infof, infoln, log, logf,
        logln, trace, tracef, traceln, warn, warnf, warnln,
    };
}

pub use crate::core::{
    capture_stack, stderr_hook, DrainOutcome, ErrorCategory, ErrorHook, ErrorReporter,
    Escalation, ExitHook, ExplicitFilter, FieldValue, Fields, Filter, Formatter, Level,
    LevelStatus, Logger, LoggerError, Logr, LogrBuilder, LogrConfig, LogrMetrics, LogrState,
    Offer, OverflowPolicy, Record, Result, ShutdownReport, StackFrame, Stringer, Target,
    TargetBuilder, TargetDrain, TargetMetrics, ThresholdFilter, WorkerStage, Writer,
    CUSTOM_LEVEL_MIN, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT, FATAL_EXIT_CODE,
    MAX_LEVEL_ID,
};
pub use formatters::{JsonFormatter, PlainFormatter, TimestampFormat};
