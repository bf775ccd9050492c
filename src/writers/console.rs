//! Console writer implementation

use crate::core::{Result, Writer};
use std::io::{self, Write};

/// Standard stream a [`ConsoleWriter`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleStream {
    #[default]
    Stdout,
    Stderr,
}

/// Writes formatted records to stdout or stderr
///
/// Route error levels to stderr by giving them their own target:
///
/// ```
/// use rust_logr::prelude::*;
/// use rust_logr::writers::{ConsoleStream, ConsoleWriter};
///
/// let errors = Target::builder("stderr")
///     .filter(Filter::threshold(Level::ERROR, Level::PANIC))
///     .formatter(PlainFormatter::new())
///     .writer(ConsoleWriter::new(ConsoleStream::Stderr))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct ConsoleWriter {
    stream: ConsoleStream,
}

impl ConsoleWriter {
    pub fn new(stream: ConsoleStream) -> Self {
        Self { stream }
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleStream::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleStream::Stderr)
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl Writer for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().lock().write_all(buf)?,
            ConsoleStream::Stderr => io::stderr().lock().write_all(buf)?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().flush()?,
            ConsoleStream::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }
}
