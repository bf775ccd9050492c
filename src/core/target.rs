//! Targets: one filter, formatter and writer behind a bounded queue
//!
//! Offers never wait on the writer. A record that does not fit in the queue
//! is dropped for this target only and reported, while the worker keeps
//! delivering what is already queued in FIFO order.

use super::{
    error::{LoggerError, Result},
    filter::Filter,
    formatter::Formatter,
    hooks::{ErrorHook, ErrorReporter},
    metrics::TargetMetrics,
    overflow_policy::OverflowPolicy,
    record::Record,
    worker::{Queued, Worker},
    writer::Writer,
};
use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default number of records a target queue holds
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

static NEXT_TARGET_ID: AtomicUsize = AtomicUsize::new(1);

/// Result of offering a record to a target
#[derive(Debug)]
pub enum Offer {
    /// The record was placed on the queue
    Accepted,
    /// The filter wanted the record but the queue was full
    Dropped,
    /// The target did not take the record.
    ///
    /// Carries an error when the refusal is a problem worth reporting:
    /// an unevaluable level, or a target that is shutting down.
    Rejected(Option<LoggerError>),
}

impl Offer {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Offer::Accepted)
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Offer::Dropped)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Offer::Rejected(_))
    }
}

/// How a target finished draining at shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every queued record went through the worker
    Drained,
    /// The deadline passed; the remaining records were discarded.
    ///
    /// `abandoned` counts what was still queued at the deadline. A record the
    /// worker had already taken but not yet started is added to
    /// [`TargetMetrics::abandoned`] instead of being written.
    TimedOut { abandoned: u64 },
}

enum WorkerSlot {
    /// Not started yet; the writer waits here
    Idle(Box<dyn Writer>),
    Running {
        done: Receiver<()>,
        handle: thread::JoinHandle<()>,
    },
    Stopped(DrainOutcome),
}

/// One configured sink
///
/// # Example
///
/// ```
/// use rust_logr::{Filter, Level, PlainFormatter, Target};
/// use rust_logr::writers::MemoryWriter;
///
/// let memory = MemoryWriter::new();
/// let target = Target::builder("audit")
///     .filter(Filter::threshold(Level::WARN, Level::PANIC))
///     .formatter(PlainFormatter::new())
///     .writer(memory.clone())
///     .capacity(64)
///     .build()
///     .unwrap();
///
/// assert_eq!(target.name(), "audit");
/// assert_eq!(target.capacity(), 64);
/// ```
pub struct Target {
    name: String,
    filter: Filter,
    formatter: Arc<dyn Formatter>,
    policy: OverflowPolicy,
    capacity: usize,
    sender: RwLock<Option<Sender<Queued>>>,
    receiver: Receiver<Queued>,
    /// Dropped by close(); disconnects `closed` to wake blocked producers
    closing: Mutex<Option<Sender<()>>>,
    closed: Receiver<()>,
    worker: Mutex<WorkerSlot>,
    abandon: Arc<AtomicBool>,
    metrics: Arc<TargetMetrics>,
    reporter: RwLock<ErrorReporter>,
}

impl Target {
    /// Create an unnamed target; it is called `target-<n>` in reports.
    pub fn new<F, W>(filter: Filter, formatter: F, writer: W, capacity: usize) -> Self
    where
        F: Formatter + 'static,
        W: Writer + 'static,
    {
        let name = format!("target-{}", NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed));
        Self::assemble(
            name,
            filter,
            Arc::new(formatter),
            Box::new(writer),
            capacity,
            OverflowPolicy::default(),
            ErrorReporter::default(),
        )
    }

    pub fn builder(name: impl Into<String>) -> TargetBuilder {
        TargetBuilder::new(name)
    }

    fn assemble(
        name: String,
        filter: Filter,
        formatter: Arc<dyn Formatter>,
        writer: Box<dyn Writer>,
        capacity: usize,
        policy: OverflowPolicy,
        reporter: ErrorReporter,
    ) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        let (closing, closed) = bounded(0);
        Self {
            name,
            filter,
            formatter,
            policy,
            capacity,
            sender: RwLock::new(Some(sender)),
            receiver,
            closing: Mutex::new(Some(closing)),
            closed,
            worker: Mutex::new(WorkerSlot::Idle(writer)),
            abandon: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(TargetMetrics::new()),
            reporter: RwLock::new(reporter),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn metrics(&self) -> &TargetMetrics {
        &self.metrics
    }

    /// Records waiting in the queue
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    /// Whether offers can still be accepted
    pub fn is_accepting(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Route this target's errors to `reporter`
    pub(crate) fn attach(&self, reporter: ErrorReporter) {
        *self.reporter.write() = reporter;
    }

    /// Spawn the worker thread. Starting a running target does nothing.
    pub fn start(&self) -> Result<()> {
        let mut slot = self.worker.lock();
        let writer = match std::mem::replace(&mut *slot, WorkerSlot::Stopped(DrainOutcome::Drained)) {
            WorkerSlot::Idle(writer) => writer,
            other => {
                *slot = other;
                return Ok(());
            }
        };

        let (done_tx, done) = bounded::<()>(1);
        let worker = Worker {
            target: self.name.clone(),
            receiver: self.receiver.clone(),
            formatter: Arc::clone(&self.formatter),
            writer,
            abandon: Arc::clone(&self.abandon),
            metrics: Arc::clone(&self.metrics),
            reporter: self.reporter.read().clone(),
            _done: done_tx,
        };

        let handle = thread::Builder::new()
            .name(format!("logr-{}", self.name))
            .spawn(move || worker.run())?;
        *slot = WorkerSlot::Running { done, handle };
        Ok(())
    }

    /// Offer a record, without waiting unless the overflow policy allows it.
    pub fn offer(&self, record: &Arc<Record>) -> Offer {
        let status = match self.filter.evaluate(&record.level()) {
            Ok(status) => status,
            Err(e) => {
                self.metrics.record_rejected();
                return Offer::Rejected(Some(e));
            }
        };
        if !status.enabled {
            self.metrics.record_rejected();
            return Offer::Rejected(None);
        }

        let item = Queued {
            record: Arc::clone(record),
            stacktrace: status.stacktrace,
        };
        self.push(item)
    }

    fn push(&self, item: Queued) -> Offer {
        let level = item.record.level();
        let (item, blocking) = {
            let guard = self.sender.read();
            let Some(sender) = guard.as_ref() else {
                return self.refuse();
            };
            match sender.try_send(item) {
                Ok(()) => {
                    self.metrics.record_accepted();
                    return Offer::Accepted;
                }
                Err(TrySendError::Full(item)) => match self.policy {
                    OverflowPolicy::BlockWithTimeout(timeout) => (item, Some((sender.clone(), timeout))),
                    OverflowPolicy::DropNewest => (item, None),
                },
                Err(TrySendError::Disconnected(_)) => return self.refuse(),
            }
        };
        self.metrics.record_queue_full();

        // The wait happens outside the sender lock and ends early on close,
        // so close() never waits on a blocked producer.
        if let Some((sender, timeout)) = blocking {
            self.metrics.record_block();
            select! {
                send(sender, item) -> sent => match sent {
                    Ok(()) => {
                        self.metrics.record_accepted();
                        return Offer::Accepted;
                    }
                    Err(_) => return self.refuse(),
                },
                recv(self.closed) -> _ => return self.refuse(),
                default(timeout) => {}
            }
        }

        let dropped = self.metrics.record_dropped() + 1;
        self.reporter
            .read()
            .report(LoggerError::queue_full(&self.name, level.name(), dropped));
        Offer::Dropped
    }

    fn refuse(&self) -> Offer {
        self.metrics.record_rejected();
        Offer::Rejected(Some(LoggerError::target_shutting_down(&self.name)))
    }

    /// Stop accepting offers. The worker drains what is queued and exits.
    ///
    /// Producers blocked on a full queue give up immediately.
    pub fn close(&self) {
        self.closing.lock().take();
        self.sender.write().take();
    }

    /// Wait for the worker to drain, abandoning what is left at `deadline`.
    ///
    /// A target that was never started is started here so its queue is
    /// still delivered. Once stopped, the first outcome is returned again.
    pub fn wait(&self, deadline: Instant) -> DrainOutcome {
        let mut slot = self.worker.lock();
        if matches!(*slot, WorkerSlot::Idle(_)) {
            drop(slot);
            if let Err(e) = self.start() {
                self.reporter.read().report(e);
            }
            slot = self.worker.lock();
        }

        let outcome = match std::mem::replace(&mut *slot, WorkerSlot::Stopped(DrainOutcome::Drained)) {
            WorkerSlot::Running { done, handle } => match done.recv_deadline(deadline) {
                Err(RecvTimeoutError::Timeout) => self.abandon_remaining(),
                _ => {
                    // Worker has exited; joining only reaps the thread
                    let _ = handle.join();
                    DrainOutcome::Drained
                }
            },
            WorkerSlot::Stopped(outcome) => outcome,
            WorkerSlot::Idle(_) => self.abandon_remaining(),
        };
        *slot = WorkerSlot::Stopped(outcome);
        outcome
    }

    /// Close, then wait up to `timeout`
    pub fn shutdown(&self, timeout: Duration) -> DrainOutcome {
        self.close();
        self.wait(Instant::now() + timeout)
    }

    fn abandon_remaining(&self) -> DrainOutcome {
        self.abandon.store(true, Ordering::Release);

        let mut abandoned = 0u64;
        while self.receiver.try_recv().is_ok() {
            abandoned += 1;
        }
        self.metrics.record_abandoned(abandoned);
        self.reporter
            .read()
            .report(LoggerError::shutdown_timeout(&self.name, abandoned));
        DrainOutcome::TimedOut { abandoned }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("filter", &self.filter)
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("queued", &self.queued())
            .finish()
    }
}

/// Builder for [`Target`]
///
/// A formatter and a writer are required; everything else has a default.
pub struct TargetBuilder {
    name: String,
    filter: Filter,
    formatter: Option<Arc<dyn Formatter>>,
    writer: Option<Box<dyn Writer>>,
    capacity: usize,
    policy: OverflowPolicy,
    on_error: Option<ErrorHook>,
}

impl TargetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: Filter::default(),
            formatter: None,
            writer: None,
            capacity: DEFAULT_QUEUE_CAPACITY,
            policy: OverflowPolicy::default(),
            on_error: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Use a formatter that is shared with other targets
    #[must_use = "builder methods return a new value"]
    pub fn shared_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Writer + 'static>(mut self, writer: W) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Queue capacity in records, at least 1
    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Hook used while the target is not registered with a [`Logr`](crate::Logr)
    #[must_use = "builder methods return a new value"]
    pub fn on_error(mut self, hook: ErrorHook) -> Self {
        self.on_error = Some(hook);
        self
    }

    pub fn build(self) -> Result<Target> {
        let formatter = self
            .formatter
            .ok_or_else(|| LoggerError::config(format!("target '{}'", self.name), "no formatter"))?;
        let writer = self
            .writer
            .ok_or_else(|| LoggerError::config(format!("target '{}'", self.name), "no writer"))?;

        Ok(Target::assemble(
            self.name,
            self.filter,
            formatter,
            writer,
            self.capacity,
            self.policy,
            ErrorReporter::new(self.on_error),
        ))
    }
}
