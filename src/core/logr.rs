//! The dispatcher: owns the targets and routes records to them

use super::{
    error::{LoggerError, Result},
    filter::LevelStatus,
    hooks::{ErrorHook, ErrorReporter, ExitHook},
    level::Level,
    logger::Logger,
    metrics::LogrMetrics,
    record::Record,
    target::{DrainOutcome, Offer, Target},
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Default deadline for draining targets at shutdown (5 seconds)
///
/// Used when the dispatcher is dropped or exits on a fatal record without an
/// explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const SHUTTING_DOWN: u8 = 2;
const STOPPED: u8 = 3;

/// Lifecycle of a [`Logr`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogrState {
    /// No target registered yet
    Created,
    Running,
    ShuttingDown,
    /// Terminal
    Stopped,
}

impl LogrState {
    fn from_u8(value: u8) -> Self {
        match value {
            CREATED => LogrState::Created,
            RUNNING => LogrState::Running,
            SHUTTING_DOWN => LogrState::ShuttingDown,
            _ => LogrState::Stopped,
        }
    }
}

/// Explicit dispatcher configuration
#[derive(Clone)]
pub struct LogrConfig {
    /// Receives every pipeline error. `None` keeps errors in the metrics only.
    pub on_error: Option<ErrorHook>,
    /// Replaces the default exit path of fatal records
    pub on_exit: Option<ExitHook>,
    pub shutdown_timeout: Duration,
}

impl Default for LogrConfig {
    fn default() -> Self {
        Self {
            on_error: None,
            on_exit: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl fmt::Debug for LogrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogrConfig")
            .field("on_error", &self.on_error.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

/// Drain result of one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDrain {
    pub target: String,
    pub outcome: DrainOutcome,
}

/// Terminal result of [`Logr::shutdown`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShutdownReport {
    targets: Vec<TargetDrain>,
}

impl ShutdownReport {
    pub fn targets(&self) -> &[TargetDrain] {
        &self.targets
    }

    /// Whether every target drained before the deadline
    pub fn is_clean(&self) -> bool {
        self.targets
            .iter()
            .all(|t| t.outcome == DrainOutcome::Drained)
    }

    /// Total records abandoned at the deadline
    pub fn abandoned(&self) -> u64 {
        self.targets
            .iter()
            .map(|t| match t.outcome {
                DrainOutcome::TimedOut { abandoned } => abandoned,
                DrainOutcome::Drained => 0,
            })
            .sum()
    }
}

/// Central dispatcher
///
/// Producers only ever see a snapshot of the target set, so registration
/// and shutdown never race with logging calls.
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
///             .filter(Filter::threshold(Level::WARN, Level::PANIC))
///             .formatter(PlainFormatter::new().disable_timestamp(true))
///             .writer(memory.clone())
///             .build()
///             .unwrap(),
///     )
///     .build()
///     .unwrap();
///
/// let logger = logr.new_logger();
/// logger.info(args!["ignored"]);
/// logger.warn(args!["disk at ", 91, "%"]);
///
/// assert!(logr.shutdown(Duration::from_secs(1)).is_clean());
/// assert_eq!(memory.lines(), ["WARN | disk at 91%"]);
/// ```
pub struct Logr {
    state: AtomicU8,
    targets: RwLock<Arc<Vec<Arc<Target>>>>,
    reporter: ErrorReporter,
    metrics: Arc<LogrMetrics>,
    exit_hook: Option<ExitHook>,
    shutdown_timeout: Duration,
    report: OnceLock<ShutdownReport>,
}

impl Logr {
    pub fn new(config: LogrConfig) -> Arc<Self> {
        let metrics = Arc::new(LogrMetrics::new());
        Arc::new(Self {
            state: AtomicU8::new(CREATED),
            targets: RwLock::new(Arc::new(Vec::new())),
            reporter: ErrorReporter::with_metrics(config.on_error, Arc::clone(&metrics)),
            metrics,
            exit_hook: config.on_exit,
            shutdown_timeout: config.shutdown_timeout,
            report: OnceLock::new(),
        })
    }

    pub fn builder() -> LogrBuilder {
        LogrBuilder::new()
    }

    /// Front-end bound to this dispatcher with an empty field set
    pub fn new_logger(self: &Arc<Self>) -> Logger {
        Logger::new(Arc::clone(self))
    }

    pub fn state(&self) -> LogrState {
        LogrState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn metrics(&self) -> &LogrMetrics {
        &self.metrics
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Current set of registered targets
    pub fn targets(&self) -> Arc<Vec<Arc<Target>>> {
        Arc::clone(&self.targets.read())
    }

    pub fn target(&self, name: &str) -> Option<Arc<Target>> {
        self.targets().iter().find(|t| t.name() == name).cloned()
    }

    /// Register and start a target.
    ///
    /// Fails once shutdown has begun.
    pub fn add_target(&self, target: Target) -> Result<()> {
        // The write lock orders registration against the shutdown snapshot
        let mut targets = self.targets.write();
        if self.state() >= LogrState::ShuttingDown {
            return Err(LoggerError::AlreadyShutdown {
                target: target.name().to_string(),
            });
        }

        target.attach(self.reporter.clone());
        target.start()?;

        let mut next = Vec::with_capacity(targets.len() + 1);
        next.extend(targets.iter().cloned());
        next.push(Arc::new(target));
        *targets = Arc::new(next);

        let _ = self
            .state
            .compare_exchange(CREATED, RUNNING, Ordering::AcqRel, Ordering::Acquire);
        Ok(())
    }

    /// OR of every target's status for `level`
    pub fn is_level_enabled(&self, level: &Level) -> LevelStatus {
        self.check_level(level).0
    }

    /// Like [`Logr::is_level_enabled`], also returning the first evaluation error
    pub(crate) fn check_level(&self, level: &Level) -> (LevelStatus, Option<LoggerError>) {
        let targets = self.targets();
        let mut status = LevelStatus::DISABLED;
        let mut error = None;
        for target in targets.iter() {
            match target.filter().evaluate(level) {
                Ok(s) => status.merge(s),
                Err(e) => {
                    error.get_or_insert(e);
                }
            }
        }
        (status, error)
    }

    /// Offer a record to every target.
    ///
    /// Never blocks on a slow target and never fails; problems go to the
    /// error hook. An invalid level id is reported once per call no matter
    /// how many targets trip over it.
    pub fn enqueue(&self, record: Record) {
        match self.state() {
            LogrState::Running => {}
            LogrState::Created => return,
            LogrState::ShuttingDown | LogrState::Stopped => {
                self.metrics.record_rejected_after_shutdown();
                self.reporter.report(LoggerError::LoggerStopped);
                return;
            }
        }
        self.metrics.record_enqueued();

        let record = Arc::new(record);
        let mut level_reported = false;
        for target in self.targets().iter() {
            let Offer::Rejected(Some(err)) = target.offer(&record) else {
                continue;
            };
            if matches!(err, LoggerError::InvalidLevelId { .. }) {
                if level_reported {
                    continue;
                }
                level_reported = true;
            }
            self.reporter.report(err);
        }
    }

    pub(crate) fn report(&self, err: LoggerError) {
        self.reporter.report(err);
    }

    /// Stop every target and wait for them to drain, at most `timeout`.
    ///
    /// Only the first call does any work; later calls return its report.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.report.get_or_init(|| self.run_shutdown(timeout)).clone()
    }

    fn run_shutdown(&self, timeout: Duration) -> ShutdownReport {
        let targets = {
            let guard = self.targets.write();
            self.state.store(SHUTTING_DOWN, Ordering::Release);
            Arc::clone(&guard)
        };
        let deadline = Instant::now() + timeout;

        // Close everything first so the workers drain in parallel
        for target in targets.iter() {
            target.close();
        }
        let drains = targets
            .iter()
            .map(|target| TargetDrain {
                target: target.name().to_string(),
                outcome: target.wait(deadline),
            })
            .collect();

        self.state.store(STOPPED, Ordering::Release);
        ShutdownReport { targets: drains }
    }

    /// Exit path of fatal records.
    ///
    /// Calls the configured exit hook, or drains and terminates the process.
    pub fn exit(&self, code: i32) {
        match &self.exit_hook {
            Some(hook) => hook(code),
            None => {
                self.shutdown(self.shutdown_timeout);
                std::process::exit(code);
            }
        }
    }
}

impl fmt::Debug for Logr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logr")
            .field("state", &self.state())
            .field("targets", &self.targets().len())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl Drop for Logr {
    fn drop(&mut self) {
        let report = self.shutdown(self.shutdown_timeout);
        if self.reporter.has_hook() {
            return;
        }

        let dropped: u64 = self.targets().iter().map(|t| t.metrics().dropped()).sum();
        let lost = dropped + report.abandoned();
        if lost > 0 {
            eprintln!(
                "[LOGR WARNING] Logger shut down with {} records lost ({} dropped on full queues, {} abandoned at the deadline)",
                lost,
                dropped,
                report.abandoned()
            );
        }
    }
}

/// Builder for [`Logr`]
///
/// # Example
/// ```
/// use rust_logr::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let logr = Logr::builder()
///     .on_error(stderr_hook())
///     .on_exit(Arc::new(|code| eprintln!("would exit with {}", code)))
///     .shutdown_timeout(Duration::from_secs(2))
///     .build()
///     .unwrap();
///
/// assert_eq!(logr.state(), LogrState::Created);
/// ```
#[derive(Default)]
pub struct LogrBuilder {
    config: LogrConfig,
    targets: Vec<Target>,
}

impl LogrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_error(mut self, hook: ErrorHook) -> Self {
        self.config.on_error = Some(hook);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_exit(mut self, hook: ExitHook) -> Self {
        self.config.on_exit = Some(hook);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Register a target when the dispatcher is built
    #[must_use = "builder methods return a new value"]
    pub fn target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn build(self) -> Result<Arc<Logr>> {
        let logr = Logr::new(self.config);
        for target in self.targets {
            logr.add_target(target)?;
        }
        Ok(logr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{fields::Fields, filter::Filter};
    use crate::writers::MemoryWriter;
    use parking_lot::Mutex;

    fn line(record: &Record, _stacktrace: bool, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(record.message().as_bytes());
        buf.push(b'\n');
        Ok(())
    }

    fn memory_target(name: &str, filter: Filter) -> (Target, MemoryWriter) {
        let memory = MemoryWriter::new();
        let target = Target::builder(name)
            .filter(filter)
            .formatter(line)
            .writer(memory.clone())
            .build()
            .unwrap();
        (target, memory)
    }

    fn collecting() -> (LogrConfig, Arc<Mutex<Vec<LoggerError>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let config = LogrConfig {
            on_error: Some(Arc::new(move |e: &LoggerError| {
                sink.lock().push(match e {
                    LoggerError::InvalidLevelId { id, max } => LoggerError::invalid_level_id(*id, *max),
                    other => LoggerError::other(other.to_string()),
                })
            })),
            ..LogrConfig::default()
        };
        (config, seen)
    }

    fn record(level: Level, msg: &str) -> Record {
        Record::print(level, Fields::new(), vec![msg.into()])
    }

    #[test]
    fn test_state_transitions() {
        let logr = Logr::new(LogrConfig::default());
        assert_eq!(logr.state(), LogrState::Created);

        let (target, _) = memory_target("a", Filter::all());
        logr.add_target(target).unwrap();
        assert_eq!(logr.state(), LogrState::Running);

        logr.shutdown(Duration::from_secs(1));
        assert_eq!(logr.state(), LogrState::Stopped);

        let (late, _) = memory_target("late", Filter::all());
        assert!(matches!(
            logr.add_target(late),
            Err(LoggerError::AlreadyShutdown { target }) if target == "late"
        ));
    }

    #[test]
    fn test_is_level_enabled_merges_targets() {
        let (warn, _) = memory_target("warn", Filter::threshold(Level::WARN, Level::ERROR));
        let (info, _) = memory_target("info", Filter::threshold(Level::INFO, Level::PANIC));
        let logr = Logr::builder().target(warn).target(info).build().unwrap();

        assert_eq!(logr.is_level_enabled(&Level::DEBUG), LevelStatus::DISABLED);
        assert_eq!(logr.is_level_enabled(&Level::INFO), LevelStatus::enabled(false));
        assert_eq!(logr.is_level_enabled(&Level::ERROR), LevelStatus::enabled(true));
    }

    #[test]
    fn test_enqueue_routes_per_target() {
        let (warn, warn_out) = memory_target("warn", Filter::threshold(Level::WARN, Level::PANIC));
        let (all, all_out) = memory_target("all", Filter::all());
        let logr = Logr::builder().target(warn).target(all).build().unwrap();

        logr.enqueue(record(Level::INFO, "info"));
        logr.enqueue(record(Level::ERROR, "error"));
        assert!(logr.shutdown(Duration::from_secs(5)).is_clean());

        assert_eq!(warn_out.lines(), ["error"]);
        assert_eq!(all_out.lines(), ["info", "error"]);
        assert_eq!(logr.metrics().records_enqueued(), 2);
    }

    #[test]
    fn test_invalid_level_reported_once_per_call() {
        let huge = Level::new(300, "HUGE", false);
        let (config, seen) = collecting();
        let logr = Logr::new(config);
        for name in ["one", "two", "three"] {
            let (target, _) = memory_target(name, Filter::explicit([huge]));
            logr.add_target(target).unwrap();
        }

        logr.enqueue(record(huge, "x"));
        logr.enqueue(record(huge, "y"));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen
            .iter()
            .all(|e| matches!(e, LoggerError::InvalidLevelId { id: 300, .. })));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (config, seen) = collecting();
        let logr = Logr::new(config);
        let (target, memory) = memory_target("a", Filter::all());
        logr.add_target(target).unwrap();
        logr.enqueue(record(Level::INFO, "once"));

        let first = logr.shutdown(Duration::from_secs(5));
        let reports = seen.lock().len();
        let second = logr.shutdown(Duration::from_secs(5));

        assert_eq!(first, second);
        assert_eq!(seen.lock().len(), reports);
        assert_eq!(memory.lines(), ["once"]);
    }

    #[test]
    fn test_enqueue_after_shutdown_is_reported() {
        let (config, seen) = collecting();
        let logr = Logr::new(config);
        let (target, memory) = memory_target("a", Filter::all());
        logr.add_target(target).unwrap();
        logr.shutdown(Duration::from_secs(1));

        logr.enqueue(record(Level::ERROR, "too late"));

        assert!(memory.lines().is_empty());
        assert_eq!(logr.metrics().rejected_after_shutdown(), 1);
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0].to_string(), "Logger already stopped");
    }

    #[test]
    fn test_exit_hook_replaces_process_exit() {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&codes);
        let logr = Logr::builder()
            .on_exit(Arc::new(move |code| sink.lock().push(code)))
            .build()
            .unwrap();

        logr.exit(3);
        assert_eq!(codes.lock().as_slice(), [3]);
        assert_eq!(logr.state(), LogrState::Created);
    }

    #[test]
    fn test_concurrent_registration() {
        let logr = Logr::new(LogrConfig::default());
        let (first, _) = memory_target("first", Filter::all());
        logr.add_target(first).unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..200 {
                    logr.enqueue(record(Level::INFO, &i.to_string()));
                }
            });
            s.spawn(|| {
                for i in 0..5 {
                    let (target, _) = memory_target(&format!("extra-{}", i), Filter::all());
                    logr.add_target(target).unwrap();
                }
            });
        });

        assert_eq!(logr.targets().len(), 6);
        assert!(logr.shutdown(Duration::from_secs(5)).is_clean());
    }
}
