//! Error types for the logging pipeline

use std::fmt;

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Broad classification of pipeline failures.
///
/// Error hooks can switch on this instead of matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A level id no filter can evaluate, or an incomplete target definition
    Configuration,
    /// A target queue was full and a record was dropped
    Overload,
    /// A formatter or writer failed for one record
    Delivery,
    /// A target did not drain before the shutdown deadline
    ShutdownTimeout,
    /// The pipeline was used outside of its running state
    Lifecycle,
    /// Raw IO or serialization failure outside of a worker
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Overload => "overload",
            ErrorCategory::Delivery => "delivery",
            ErrorCategory::ShutdownTimeout => "shutdown-timeout",
            ErrorCategory::Lifecycle => "lifecycle",
            ErrorCategory::Io => "io",
        };
        f.write_str(s)
    }
}

/// Stage of the worker loop in which a panic was caught
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStage {
    Format,
    Write,
    Flush,
}

impl fmt::Display for WorkerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStage::Format => f.write_str("format"),
            WorkerStage::Write => f.write_str("write"),
            WorkerStage::Flush => f.write_str("flush"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Level id beyond the supported range
    #[error("Invalid level id {id}: maximum is {max}")]
    InvalidLevelId { id: u32, max: u32 },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Target queue full, record dropped for that target
    #[error("Queue full for target '{target}': dropped {level} record ({dropped} dropped in total)")]
    QueueFull {
        target: String,
        level: String,
        dropped: u64,
    },

    /// Formatter returned an error
    #[error("Formatter error for target '{target}': {message}")]
    FormatterError { target: String, message: String },

    /// Writer returned an error
    #[error("Writer error for target '{target}': {message}")]
    WriterError { target: String, message: String },

    /// Formatter or writer panicked inside the worker
    #[error("Target '{target}' panicked during {stage}: {message}")]
    WorkerPanic {
        target: String,
        stage: WorkerStage,
        message: String,
    },

    /// Target did not drain before the shutdown deadline
    #[error("Target '{target}' did not drain before the deadline: {abandoned} records abandoned")]
    ShutdownTimeout { target: String, abandoned: u64 },

    /// Offer made to a target that stopped accepting records
    #[error("Target '{target}' is shutting down")]
    TargetShuttingDown { target: String },

    /// Logging call after shutdown began
    #[error("Logger already stopped")]
    LoggerStopped,

    /// Target registration after shutdown began
    #[error("Cannot add target '{target}': logger already shut down")]
    AlreadyShutdown { target: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid level id error
    pub fn invalid_level_id(id: u32, max: u32) -> Self {
        LoggerError::InvalidLevelId { id, max }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a queue full error with drop details
    pub fn queue_full(target: impl Into<String>, level: impl Into<String>, dropped: u64) -> Self {
        LoggerError::QueueFull {
            target: target.into(),
            level: level.into(),
            dropped,
        }
    }

    /// Create a formatter error
    pub fn formatter(target: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a writer error
    pub fn writer(target: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::WriterError {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn worker_panic(
        target: impl Into<String>,
        stage: WorkerStage,
        message: impl Into<String>,
    ) -> Self {
        LoggerError::WorkerPanic {
            target: target.into(),
            stage,
            message: message.into(),
        }
    }

    /// Create a shutdown timeout error
    pub fn shutdown_timeout(target: impl Into<String>, abandoned: u64) -> Self {
        LoggerError::ShutdownTimeout {
            target: target.into(),
            abandoned,
        }
    }

    pub fn target_shutting_down(target: impl Into<String>) -> Self {
        LoggerError::TargetShuttingDown {
            target: target.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Position of this error in the failure taxonomy
    pub fn category(&self) -> ErrorCategory {
        match self {
            LoggerError::InvalidLevelId { .. } | LoggerError::InvalidConfiguration { .. } => {
                ErrorCategory::Configuration
            }
            LoggerError::QueueFull { .. } => ErrorCategory::Overload,
            LoggerError::FormatterError { .. }
            | LoggerError::WriterError { .. }
            | LoggerError::WorkerPanic { .. } => ErrorCategory::Delivery,
            LoggerError::ShutdownTimeout { .. } => ErrorCategory::ShutdownTimeout,
            LoggerError::TargetShuttingDown { .. }
            | LoggerError::LoggerStopped
            | LoggerError::AlreadyShutdown { .. } => ErrorCategory::Lifecycle,
            LoggerError::Io(_) | LoggerError::Json(_) | LoggerError::Other(_) => ErrorCategory::Io,
        }
    }

    /// Name of the target this error concerns, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            LoggerError::QueueFull { target, .. }
            | LoggerError::FormatterError { target, .. }
            | LoggerError::WriterError { target, .. }
            | LoggerError::WorkerPanic { target, .. }
            | LoggerError::ShutdownTimeout { target, .. }
            | LoggerError::TargetShuttingDown { target }
            | LoggerError::AlreadyShutdown { target } => Some(target),
            _ => None,
        }
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::queue_full("file", "INFO", 3);
        assert!(matches!(err, LoggerError::QueueFull { dropped: 3, .. }));

        let err = LoggerError::invalid_level_id(300, 256);
        assert!(matches!(err, LoggerError::InvalidLevelId { id: 300, .. }));

        let err = LoggerError::shutdown_timeout("net", 12);
        assert_eq!(err.target(), Some("net"));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::queue_full("file", "INFO", 1);
        assert_eq!(
            err.to_string(),
            "Queue full for target 'file': dropped INFO record (1 dropped in total)"
        );

        let err = LoggerError::shutdown_timeout("net", 7);
        assert_eq!(
            err.to_string(),
            "Target 'net' did not drain before the deadline: 7 records abandoned"
        );

        let err = LoggerError::worker_panic("console", WorkerStage::Write, "boom");
        assert_eq!(err.to_string(), "Target 'console' panicked during write: boom");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            LoggerError::invalid_level_id(999, 256).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            LoggerError::queue_full("t", "INFO", 1).category(),
            ErrorCategory::Overload
        );
        assert_eq!(
            LoggerError::formatter("t", "bad").category(),
            ErrorCategory::Delivery
        );
        assert_eq!(
            LoggerError::shutdown_timeout("t", 1).category(),
            ErrorCategory::ShutdownTimeout
        );
        assert_eq!(LoggerError::LoggerStopped.category(), ErrorCategory::Lifecycle);
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("static str")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload = std::panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");
    }
}
