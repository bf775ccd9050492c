//! Error-reporting and exit hooks
//!
//! Every internal failure of the pipeline is funneled through an
//! [`ErrorReporter`]. The reporter never lets a hook panic escape into the
//! pipeline and drops reports raised from inside a hook on the same thread,
//! so a hook that logs cannot recurse into itself.

use super::error::{panic_message, LoggerError};
use super::metrics::LogrMetrics;
use std::cell::Cell;
use std::io::{self, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Callback invoked with every pipeline error
pub type ErrorHook = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Callback invoked after a fatal record has been enqueued
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

thread_local! {
    static IN_HOOK: Cell<bool> = const { Cell::new(false) };
}

/// Hook printing `[LOGR ERROR] <error>` lines to standard error
pub fn stderr_hook() -> ErrorHook {
    Arc::new(|err| {
        let _ = writeln!(io::stderr(), "[LOGR ERROR] {}", err);
    })
}

#[derive(Clone, Default)]
pub struct ErrorReporter {
    hook: Option<ErrorHook>,
    metrics: Arc<LogrMetrics>,
}

impl ErrorReporter {
    pub fn new(hook: Option<ErrorHook>) -> Self {
        Self::with_metrics(hook, Arc::new(LogrMetrics::new()))
    }

    pub(crate) fn with_metrics(hook: Option<ErrorHook>, metrics: Arc<LogrMetrics>) -> Self {
        Self { hook, metrics }
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    pub fn metrics(&self) -> &LogrMetrics {
        &self.metrics
    }

    pub fn report(&self, err: LoggerError) {
        self.metrics.record_error_reported();

        let Some(hook) = &self.hook else {
            return;
        };

        if IN_HOOK.with(Cell::get) {
            self.metrics.record_error_suppressed();
            return;
        }

        IN_HOOK.with(|flag| flag.set(true));
        let result = catch_unwind(AssertUnwindSafe(|| hook(&err)));
        IN_HOOK.with(|flag| flag.set(false));

        if let Err(payload) = result {
            let _ = writeln!(
                io::stderr(),
                "[LOGR CRITICAL] Error hook panicked while reporting '{}': {}",
                err,
                panic_message(payload.as_ref())
            );
        }
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}
