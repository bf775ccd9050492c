//! File logging example
//!
//! Demonstrates routing one logger to a plain-text file, a JSON file and an
//! audit file that only accepts application-defined levels.
//!
//! Run with: cargo run --example file_logging

use rust_logr::prelude::*;
use rust_logr::writers::FileWriter;
use std::time::Duration;

const LOGIN: Level = Level::new(100, "LOGIN", false);
const LOGOUT: Level = Level::new(101, "LOGOUT", false);

fn main() -> Result<()> {
    println!("=== Rust Logr - File Logging Example ===\n");

    let logr = Logr::builder()
        .on_error(stderr_hook())
        .target(
            Target::builder("text")
                .filter(Filter::threshold(Level::DEBUG, Level::ERROR))
                .formatter(PlainFormatter::new().timestamp_format(TimestampFormat::Rfc3339))
                .writer(FileWriter::new("application.log")?)
                .build()?,
        )
        .target(
            Target::builder("json")
                .filter(Filter::threshold(Level::INFO, Level::PANIC))
                .formatter(JsonFormatter::new().key_context_fields("context"))
                .writer(FileWriter::new("application.jsonl")?)
                .build()?,
        )
        .target(
            Target::builder("audit")
                .filter(Filter::explicit([LOGIN, LOGOUT]))
                .formatter(JsonFormatter::new())
                .writer(FileWriter::new("audit.jsonl")?)
                .build()?,
        )
        .build()?;

    let logger = logr.new_logger().with_field("service", "billing");

    println!("1. Application lifecycle:");
    logger.info(args!["Application started"]);
    logger.debug(args!["Loading configuration..."]);
    logger.warn(args!["Using default settings for some options"]);
    logger.error(args!["Failed to load optional plugin"]);

    println!("\n2. Audit events:");
    let session = logger.with_fields([("user", "alice")]);
    session.log(LOGIN, args!["Session opened"]);
    for i in 1..=3 {
        session.infof("Processing invoice {}/3", args![i]);
    }
    session.log(LOGOUT, args!["Session closed"]);

    let report = logr.shutdown(Duration::from_secs(2));
    if !report.is_clean() {
        eprintln!("{} records were abandoned", report.abandoned());
    }

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log', 'application.jsonl' and 'audit.jsonl'");

    Ok(())
}
