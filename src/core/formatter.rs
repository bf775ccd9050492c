//! Formatter trait: renders a record into bytes for a writer

use super::{error::Result, record::Record};

/// Renders records for one or more targets.
///
/// A formatter may be shared by several targets and is called concurrently
/// from their workers, so it must not keep unsynchronized mutable state.
/// It must not assume the record was rendered before; use
/// [`Record::message`] to obtain the message text.
///
/// Closures with the matching signature are formatters:
///
/// ```
/// use rust_logr::{Formatter, Record};
///
/// let bare = |record: &Record, _stacktrace: bool, buf: &mut Vec<u8>| -> rust_logr::Result<()> {
///     buf.extend_from_slice(record.message().as_bytes());
///     buf.push(b'\n');
///     Ok(())
/// };
/// # fn check<F: Formatter>(_: &F) {}
/// # check(&bare);
/// ```
pub trait Formatter: Send + Sync {
    /// Append the rendering of `record` to `buf`.
    ///
    /// `stacktrace` tells whether the target wants the captured stack
    /// included.
    fn format(&self, record: &Record, stacktrace: bool, buf: &mut Vec<u8>) -> Result<()>;
}

impl<F> Formatter for F
where
    F: Fn(&Record, bool, &mut Vec<u8>) -> Result<()> + Send + Sync,
{
    fn format(&self, record: &Record, stacktrace: bool, buf: &mut Vec<u8>) -> Result<()> {
        self(record, stacktrace, buf)
    }
}
