//! In-memory writer for tests and embedding

use crate::core::{Result, Writer};
use parking_lot::Mutex;
use std::sync::Arc;

/// Collects formatted output in a shared buffer.
///
/// Clones share the buffer: hand one clone to a target and keep another to
/// read what was written.
///
/// ```
/// use rust_logr::Writer;
/// use rust_logr::writers::MemoryWriter;
///
/// let memory = MemoryWriter::new();
/// let mut handle = memory.clone();
/// handle.write(b"one\ntwo\n").unwrap();
///
/// assert_eq!(memory.lines(), ["one", "two"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }

    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Writer for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.buf.lock().extend_from_slice(buf);
        Ok(())
    }
}
