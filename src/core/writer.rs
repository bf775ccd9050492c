//! Writer trait for log output destinations

use super::error::Result;

/// Destination a target writes formatted records to.
///
/// Each target moves its writer into its worker thread, so a writer is only
/// ever called from one thread at a time. Writers that need to be observed or
/// closed by the application hand out a shared handle (see
/// [`MemoryWriter`](crate::writers::MemoryWriter)).
pub trait Writer: Send {
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Called when the queue runs empty and when the target stops
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
