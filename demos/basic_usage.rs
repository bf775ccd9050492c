//! Basic logger usage example
//!
//! Demonstrates a console target, the three message styles and level
//! thresholds.
//!
//! Run with: cargo run --example basic_usage

use rust_logr::prelude::*;
use rust_logr::writers::ConsoleWriter;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Logr - Basic Usage Example ===\n");

    let logr = Logr::builder()
        .on_error(stderr_hook())
        .target(
            Target::builder("console")
                .filter(Filter::threshold(Level::TRACE, Level::PANIC))
                .formatter(PlainFormatter::new())
                .writer(ConsoleWriter::stdout())
                .build()?,
        )
        .build()?;
    let logger = logr.new_logger();

    println!("1. Logging at different levels:");
    trace!(logger, "This is a trace message");
    debug!(logger, "This is a debug message");
    info!(logger, "This is an info message");
    warn!(logger, "This is a warning message");
    error!(logger, "This is an error message");

    println!("\n2. Message styles:");
    info!(logger, "Print style: ", 3, 4, " items");
    infof!(logger, "Template style: {} of {} items", 3, 4);
    infoln!(logger, "Line", "style:", 3, "items");

    println!("\n3. Context fields:");
    let request = logger.with_fields([("request_id", FieldValue::from(42)), ("user", "bob".into())]);
    request.info(args!["Request handled"]);
    logger.info(args!["Parent logger keeps its own fields"]);

    println!("\n4. Panic escalation returned to the caller:");
    let escalation = logger.panicf("cache {} is corrupt", args!["sessions"]);
    println!("   Dismissed: {}", escalation.message());
    escalation.dismiss();

    logr.shutdown(Duration::from_secs(1));

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
