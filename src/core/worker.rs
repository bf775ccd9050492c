//! Per-target worker loop
//!
//! A worker owns its target's writer and consumes the target queue in FIFO
//! order on a dedicated thread. Formatter and writer failures, including
//! panics, are isolated per record: they are reported and the loop moves on.

use super::{
    error::{panic_message, LoggerError, WorkerStage},
    formatter::Formatter,
    hooks::ErrorReporter,
    metrics::TargetMetrics,
    record::Record,
    writer::Writer,
};
use crossbeam_channel::{Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Buffers that grew past this size are released after use
const MAX_RETAINED_BUFFER: usize = 64 * 1024;

/// A record accepted by a target, with the stack decision taken at offer time
pub(crate) struct Queued {
    pub(crate) record: Arc<Record>,
    pub(crate) stacktrace: bool,
}

pub(crate) struct Worker {
    pub(crate) target: String,
    pub(crate) receiver: Receiver<Queued>,
    pub(crate) formatter: Arc<dyn Formatter>,
    pub(crate) writer: Box<dyn Writer>,
    pub(crate) abandon: Arc<AtomicBool>,
    pub(crate) metrics: Arc<TargetMetrics>,
    pub(crate) reporter: ErrorReporter,
    /// Dropped when the loop exits, which wakes anyone waiting on the target
    pub(crate) _done: Sender<()>,
}

impl Worker {
    /// Consume the queue until every sender is gone or the target is abandoned
    pub(crate) fn run(mut self) {
        let mut buf = Vec::with_capacity(1024);

        loop {
            let item = match self.receiver.recv() {
                Ok(item) => item,
                Err(_) => break,
            };
            // Taken after the deadline: the waiter already gave up on it, so it
            // is counted with the abandoned records instead of being written.
            if self.abandon.load(Ordering::Acquire) {
                self.metrics.record_abandoned(1);
                return;
            }

            self.deliver(&item, &mut buf);

            if self.receiver.is_empty() {
                self.flush();
            }
        }

        if !self.abandon.load(Ordering::Acquire) {
            self.flush();
        }
    }

    fn deliver(&mut self, item: &Queued, buf: &mut Vec<u8>) {
        buf.clear();
        if buf.capacity() > MAX_RETAINED_BUFFER {
            buf.shrink_to(1024);
        }

        let formatter = &self.formatter;
        let formatted = catch_unwind(AssertUnwindSafe(|| {
            formatter.format(&item.record, item.stacktrace, buf)
        }));
        match formatted {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.fail(LoggerError::formatter(&self.target, e.to_string()));
                return;
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.fail(LoggerError::worker_panic(&self.target, WorkerStage::Format, message));
                return;
            }
        }

        let writer = &mut self.writer;
        let written = catch_unwind(AssertUnwindSafe(|| writer.write(buf)));
        match written {
            Ok(Ok(())) => {
                self.metrics.record_delivered();
            }
            Ok(Err(e)) => {
                self.fail(LoggerError::writer(&self.target, e.to_string()));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.fail(LoggerError::worker_panic(&self.target, WorkerStage::Write, message));
            }
        }
    }

    fn flush(&mut self) {
        let writer = &mut self.writer;
        match catch_unwind(AssertUnwindSafe(|| writer.flush())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.reporter
                    .report(LoggerError::writer(&self.target, e.to_string()));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.reporter.report(LoggerError::worker_panic(
                    &self.target,
                    WorkerStage::Flush,
                    message,
                ));
            }
        }
    }

    fn fail(&self, err: LoggerError) {
        self.metrics.record_failed();
        self.reporter.report(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{error::Result, fields::Fields, level::Level};
    use crossbeam_channel::bounded;
    use parking_lot::Mutex;

    struct Collect(Arc<Mutex<Vec<String>>>);

    impl Writer for Collect {
        fn write(&mut self, buf: &[u8]) -> Result<()> {
            let line = String::from_utf8_lossy(buf).into_owned();
            if line.contains("explode") {
                panic!("writer exploded");
            }
            self.0.lock().push(line);
            Ok(())
        }
    }

    fn message_only(record: &Record, _stacktrace: bool, buf: &mut Vec<u8>) -> Result<()> {
        if record.message() == "bad" {
            return Err(LoggerError::other("cannot format"));
        }
        buf.extend_from_slice(record.message().as_bytes());
        Ok(())
    }

    fn queued(message: &str) -> Queued {
        Queued {
            record: Arc::new(Record::print(
                Level::INFO,
                Fields::new(),
                vec![message.into()],
            )),
            stacktrace: false,
        }
    }

    #[test]
    fn test_worker_isolates_failures() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let reporter = ErrorReporter::new(Some(Arc::new(move |e: &LoggerError| {
            sink.lock().push(e.category());
        })));

        let (tx, rx) = bounded(16);
        let (done_tx, done_rx) = bounded::<()>(1);
        let metrics = Arc::new(TargetMetrics::new());
        let worker = Worker {
            target: "test".to_string(),
            receiver: rx,
            formatter: Arc::new(message_only),
            writer: Box::new(Collect(Arc::clone(&lines))),
            abandon: Arc::new(AtomicBool::new(false)),
            metrics: Arc::clone(&metrics),
            reporter,
            _done: done_tx,
        };

        for msg in ["one", "bad", "explode", "two"] {
            tx.send(queued(msg)).unwrap();
        }
        drop(tx);
        worker.run();

        assert!(done_rx.recv().is_err());
        assert_eq!(lines.lock().as_slice(), ["one", "two"]);
        assert_eq!(metrics.delivered(), 2);
        assert_eq!(metrics.failed(), 2);
        assert_eq!(errors.lock().len(), 2);
    }

    /// Writer that raises the abandon flag while writing its first record
    struct AbandonDuringWrite {
        abandon: Arc<AtomicBool>,
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl Writer for AbandonDuringWrite {
        fn write(&mut self, buf: &[u8]) -> Result<()> {
            self.lines.lock().push(String::from_utf8_lossy(buf).into_owned());
            self.abandon.store(true, Ordering::Release);
            Ok(())
        }
    }

    #[test]
    fn test_record_taken_after_abandon_is_counted_not_written() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let abandon = Arc::new(AtomicBool::new(false));
        let (tx, rx) = bounded(16);
        let (done_tx, _done_rx) = bounded::<()>(1);
        let metrics = Arc::new(TargetMetrics::new());
        let leftover = rx.clone();
        let worker = Worker {
            target: "late".to_string(),
            receiver: rx,
            formatter: Arc::new(message_only),
            writer: Box::new(AbandonDuringWrite {
                abandon: Arc::clone(&abandon),
                lines: Arc::clone(&lines),
            }),
            abandon,
            metrics: Arc::clone(&metrics),
            reporter: ErrorReporter::default(),
            _done: done_tx,
        };

        for msg in ["first", "second", "third"] {
            tx.send(queued(msg)).unwrap();
        }
        drop(tx);
        worker.run();

        // "second" was taken after the flag went up and never reached the writer
        assert_eq!(lines.lock().as_slice(), ["first"]);
        assert_eq!(metrics.delivered(), 1);
        assert_eq!(metrics.abandoned(), 1);
        assert_eq!(leftover.len(), 1);
    }
}
