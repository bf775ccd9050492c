//! Core dispatch types and traits

pub mod error;
pub mod fields;
pub mod filter;
pub mod formatter;
pub mod hooks;
pub mod level;
pub mod logger;
pub mod logr;
pub mod metrics;
pub mod overflow_policy;
pub mod record;
pub mod target;
mod worker;
pub mod writer;

pub use error::{ErrorCategory, LoggerError, Result, WorkerStage};
pub use fields::{FieldValue, Fields, Stringer};
pub use filter::{ExplicitFilter, Filter, LevelStatus, ThresholdFilter};
pub use formatter::Formatter;
pub use hooks::{stderr_hook, ErrorHook, ErrorReporter, ExitHook};
pub use level::{Level, CUSTOM_LEVEL_MIN, MAX_LEVEL_ID};
pub use logger::{Escalation, Logger, FATAL_EXIT_CODE};
pub use logr::{
    Logr, LogrBuilder, LogrConfig, LogrState, ShutdownReport, TargetDrain,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use metrics::{LogrMetrics, TargetMetrics};
pub use overflow_policy::OverflowPolicy;
pub use record::{capture_stack, Record, StackFrame};
pub use target::{DrainOutcome, Offer, Target, TargetBuilder, DEFAULT_QUEUE_CAPACITY};
pub use writer::Writer;
