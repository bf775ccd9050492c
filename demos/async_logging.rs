//! Concurrent logging example
//!
//! Demonstrates many producer threads sharing one pipeline, a slow target
//! that drops under load, and the shutdown report.
//!
//! Run with: cargo run --example async_logging

use rust_logr::prelude::*;
use rust_logr::writers::{ConsoleWriter, MemoryWriter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Writer that takes a while for every record
struct SlowWriter(MemoryWriter);

impl Writer for SlowWriter {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        thread::sleep(Duration::from_millis(2));
        self.0.write(buf)
    }
}

fn main() -> Result<()> {
    println!("=== Rust Logr - Concurrent Logging Example ===\n");

    let overloads = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&overloads);
    let slow = MemoryWriter::new();

    let logr = Logr::builder()
        .on_error(Arc::new(move |err: &LoggerError| {
            if err.category() == ErrorCategory::Overload {
                counter.fetch_add(1, Ordering::Relaxed);
            } else {
                eprintln!("[LOGR ERROR] {}", err);
            }
        }))
        .target(
            Target::builder("console")
                .filter(Filter::threshold(Level::WARN, Level::PANIC))
                .formatter(PlainFormatter::new())
                .writer(ConsoleWriter::stdout())
                .build()?,
        )
        .target(
            Target::builder("slow")
                .filter(Filter::all())
                .formatter(JsonFormatter::new())
                .writer(SlowWriter(slow.clone()))
                .capacity(32)
                .build()?,
        )
        .build()?;

    println!("1. Five threads logging 200 records each:");
    let handles: Vec<_> = (0..5)
        .map(|thread_id| {
            let logger = logr.new_logger().with_field("thread", thread_id);
            thread::spawn(move || {
                for i in 0..200 {
                    if i % 50 == 0 {
                        logger.warnf("Thread {} reached {}", args![thread_id, i]);
                    } else {
                        logger.infof("Thread {} - Message {}", args![thread_id, i]);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    println!("\n2. Shutting down:");
    let report = logr.shutdown(Duration::from_secs(2));
    for drain in report.targets() {
        println!("   {}: {:?}", drain.target, drain.outcome);
    }

    if let Some(target) = logr.target("slow") {
        let metrics = target.metrics();
        println!(
            "   slow target: {} accepted, {} dropped ({} reports), {} written",
            metrics.accepted(),
            metrics.dropped(),
            overloads.load(Ordering::Relaxed),
            slow.lines().len()
        );
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
