//! Stress tests for queueing, overload and shutdown
//!
//! These tests verify:
//! - Records from many producers are neither lost nor duplicated
//! - Each producer's records keep their order within a target
//! - Overload drops are counted and reported one by one
//! - A stalled sink cannot hold shutdown past its deadline
//! - Thread safety of registration and shutdown under logging load

use crossbeam_channel::{bounded, Receiver};
use rust_logr::prelude::*;
use rust_logr::writers::{FileWriter, MemoryWriter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn bare() -> PlainFormatter {
    PlainFormatter::new()
        .disable_timestamp(true)
        .disable_level(true)
        .disable_stacktrace(true)
}

fn counting_hook() -> (ErrorHook, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    let hook: ErrorHook = Arc::new(move |_: &LoggerError| {
        sink.fetch_add(1, Ordering::Relaxed);
    });
    (hook, count)
}

/// Writer that blocks on every write until its gate channel is dropped
struct Stalled {
    gate: Receiver<()>,
}

impl Writer for Stalled {
    fn write(&mut self, _buf: &[u8]) -> rust_logr::Result<()> {
        let _ = self.gate.recv();
        Ok(())
    }
}

/// Many producers, a queue large enough for everything: all records arrive once
#[test]
fn test_concurrent_producers_no_loss() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 500;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("concurrent.log");

    let logr = Logr::builder()
        .target(
            Target::builder("file")
                .filter(Filter::all())
                .formatter(bare())
                .writer(FileWriter::new(&log_file).expect("Failed to create writer"))
                .capacity(PRODUCERS * PER_PRODUCER)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    thread::scope(|s| {
        for producer in 0..PRODUCERS {
            let logger = logr.new_logger();
            s.spawn(move || {
                for i in 0..PER_PRODUCER {
                    logger.infof("{}:{}", args![producer, i]);
                }
            });
        }
    });

    assert!(logr.shutdown(Duration::from_secs(10)).is_clean());

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for line in content.lines() {
        *seen.entry(line).or_default() += 1;
    }
    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert!(seen.values().all(|&n| n == 1), "Duplicate records written");
}

/// Interleaving across producers is free, but each producer's order holds
#[test]
fn test_fifo_per_producer() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 1000;

    let memory = MemoryWriter::new();
    let logr = Logr::builder()
        .target(
            Target::builder("memory")
                .filter(Filter::all())
                .formatter(bare())
                .writer(memory.clone())
                .capacity(256)
                .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_secs(5)))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    thread::scope(|s| {
        for producer in 0..PRODUCERS {
            let logger = logr.new_logger();
            s.spawn(move || {
                for i in 0..PER_PRODUCER {
                    logger.infof("{} {}", args![producer, i]);
                }
            });
        }
    });
    logr.shutdown(Duration::from_secs(10));

    let mut next = [0usize; PRODUCERS];
    for line in memory.lines() {
        let (producer, seq) = line.split_once(' ').expect("Malformed line");
        let producer: usize = producer.parse().unwrap();
        let seq: usize = seq.parse().unwrap();
        assert_eq!(seq, next[producer], "Producer {} out of order", producer);
        next[producer] += 1;
    }
    assert_eq!(next, [PER_PRODUCER; PRODUCERS]);
}

/// A flooded target drops, reports every drop and never blocks the producer
#[test]
fn test_overload_drops_reported() {
    let (hook, reports) = counting_hook();
    let (gate_tx, gate_rx) = bounded::<()>(0);

    let logr = Logr::builder()
        .on_error(hook)
        .target(
            Target::builder("stalled")
                .filter(Filter::all())
                .formatter(bare())
                .writer(Stalled { gate: gate_rx })
                .capacity(8)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let logger = logr.new_logger();

    let started = Instant::now();
    for i in 0..10_000 {
        logger.debug(args![i]);
    }
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "Producer was held up by a stalled sink"
    );

    let target = logr.target("stalled").unwrap();
    let metrics = target.metrics();
    assert!(metrics.dropped() >= 10_000 - 9);
    assert_eq!(metrics.accepted() + metrics.dropped(), 10_000);
    assert_eq!(reports.load(Ordering::Relaxed) as u64, metrics.dropped());

    drop(gate_tx);
    logr.shutdown(Duration::from_secs(5));
}

/// Shutdown returns at its deadline even though the writer never finishes
#[test]
fn test_stalled_sink_bounded_by_deadline() {
    let (hook, reports) = counting_hook();
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let healthy = MemoryWriter::new();

    let logr = Logr::builder()
        .on_error(hook)
        .target(
            Target::builder("stalled")
                .filter(Filter::all())
                .formatter(bare())
                .writer(Stalled { gate: gate_rx })
                .build()
                .unwrap(),
        )
        .target(
            Target::builder("healthy")
                .filter(Filter::all())
                .formatter(bare())
                .writer(healthy.clone())
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let logger = logr.new_logger();

    for i in 0..20 {
        logger.info(args![i]);
    }

    let started = Instant::now();
    let report = logr.shutdown(Duration::from_millis(200));
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed < Duration::from_secs(3), "Shutdown overran: {:?}", elapsed);
    assert!(!report.is_clean());

    let stalled = report
        .targets()
        .iter()
        .find(|t| t.target == "stalled")
        .unwrap();
    // One record is stuck inside the writer, the rest were still queued
    assert_eq!(stalled.outcome, DrainOutcome::TimedOut { abandoned: 19 });
    assert_eq!(report.abandoned(), 19);
    assert_eq!(healthy.lines().len(), 20);
    assert_eq!(reports.load(Ordering::Relaxed), 1);

    drop(gate_tx);
}

/// Logging, registration and shutdown racing each other stay consistent
#[test]
fn test_registration_and_shutdown_under_load() {
    let (hook, _reports) = counting_hook();
    let logr = Logr::builder().on_error(hook).build().unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            let logger = logr.new_logger();
            s.spawn(move || {
                for i in 0..2_000 {
                    logger.warn(args![i]);
                }
            });
        }

        s.spawn(|| {
            for n in 0..16 {
                let target = Target::builder(format!("late-{}", n))
                    .filter(Filter::all())
                    .formatter(bare())
                    .writer(MemoryWriter::new())
                    .build()
                    .unwrap();
                if let Err(e) = logr.add_target(target) {
                    assert_eq!(e.category(), ErrorCategory::Lifecycle);
                }
            }
        });

        s.spawn(|| {
            thread::sleep(Duration::from_millis(5));
            logr.shutdown(Duration::from_secs(5));
        });
    });

    assert_eq!(logr.state(), LogrState::Stopped);
    let report = logr.shutdown(Duration::ZERO);
    assert_eq!(report.targets().len(), logr.targets().len());
    assert!(report.is_clean());

    // Accepted records were all written once the drain was clean
    for target in logr.targets().iter() {
        let metrics = target.metrics();
        assert_eq!(metrics.accepted(), metrics.delivered() + metrics.failed());
    }
}

/// Rapid bursts against a tiny queue with a blocking policy lose nothing
#[test]
fn test_rapid_burst_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("burst.log");

    let logr = Logr::builder()
        .target(
            Target::builder("burst")
                .filter(Filter::threshold(Level::TRACE, Level::PANIC))
                .formatter(bare())
                .writer(FileWriter::new(&log_file).expect("Failed to create writer"))
                .capacity(10)
                .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_secs(5)))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let logger = logr.new_logger();

    for burst in 0..10 {
        for i in 0..20 {
            logger.tracef("Burst {} trace {}", args![burst, i]);
        }
        logger.errorf("Burst {} complete", args![burst]);
    }
    logr.shutdown(Duration::from_secs(5));

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 10 * 21);
    for burst in 0..10 {
        assert!(
            content.contains(&format!("Burst {} complete", burst)),
            "Burst {} completion marker missing!",
            burst
        );
    }
}

/// A producer waiting on a full blocking queue cannot stretch shutdown
#[test]
fn test_blocked_producer_does_not_hold_shutdown() {
    let (hook, reports) = counting_hook();
    let (gate_tx, gate_rx) = bounded::<()>(0);

    let logr = Logr::builder()
        .on_error(hook)
        .target(
            Target::builder("durable")
                .filter(Filter::all())
                .formatter(bare())
                .writer(Stalled { gate: gate_rx })
                .capacity(1)
                .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_secs(2)))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let logger = logr.new_logger();
    logger.info(args!["writing"]);
    logger.info(args!["queued"]);

    thread::scope(|s| {
        let blocked = logr.new_logger();
        let producer = s.spawn(move || {
            let started = Instant::now();
            blocked.info(args!["blocked"]);
            started.elapsed()
        });
        thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        let report = logr.shutdown(Duration::from_millis(50));
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_millis(500), "Shutdown overran: {:?}", elapsed);
        assert_eq!(report.abandoned(), 1);

        let waited = producer.join().unwrap();
        assert!(waited < Duration::from_secs(1), "Producer waited {:?}", waited);
    });

    let metrics = logr.target("durable").unwrap().metrics().clone();
    assert_eq!(metrics.dropped(), 0);
    // Shutdown timeout plus the refused offer
    assert_eq!(reports.load(Ordering::Relaxed), 2);

    drop(gate_tx);
}
