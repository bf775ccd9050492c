//! Overflow policies for target queues
//!
//! When a target's queue is full, the policy decides whether the producer
//! gives up at once or waits a bounded amount of time for space. Either way
//! a record that does not fit is dropped and reported, never silently lost.

use std::fmt;
use std::time::Duration;

/// Policy for handling a full target queue
///
/// # Example
///
/// ```
/// use rust_logr::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: drop and report
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::DropNewest);
///
/// // Durability-sensitive sink: wait up to 50ms for space
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(50));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the incoming record immediately
    ///
    /// Producers never wait. Use this for latency-sensitive callers.
    #[default]
    DropNewest,

    /// Wait up to the given duration for space, then drop
    ///
    /// Bounds the latency a slow sink can add to a producer.
    BlockWithTimeout(Duration),
}

impl OverflowPolicy {
    /// Longest time an offer may wait under this policy
    pub fn max_wait(&self) -> Duration {
        match self {
            OverflowPolicy::DropNewest => Duration::ZERO,
            OverflowPolicy::BlockWithTimeout(timeout) => *timeout,
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
        }
    }
}
