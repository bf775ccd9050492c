//! Logging macros for the three message styles.
//!
//! Operands are converted with [`FieldValue::from`](crate::FieldValue), so
//! anything with a `From` impl can be passed directly.
//!
//! - `info!(logger, a, b, ..)` concatenates operands, spacing two adjacent
//!   operands when neither is a string
//! - `infof!(logger, "template {}", a, ..)` fills `{}` placeholders in order
//! - `infoln!(logger, a, b, ..)` joins operands with single spaces
//!
//! # Examples
//!
//! ```
//! use rust_logr::prelude::*;
//!
//! let logr = Logr::builder().build().unwrap();
//! let logger = logr.new_logger();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! infof!(logger, "Server listening on port {}", port);
//!
//! let user_id = 42;
//! infoln!(logger, "User", user_id, "performed action:", "login");
//! ```

/// Build the operand list of a logging call.
///
/// # Examples
///
/// ```
/// use rust_logr::{args, FieldValue};
///
/// let operands: Vec<FieldValue> = args!["answer", 42, true];
/// assert_eq!(operands.len(), 3);
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::FieldValue>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::FieldValue::from($arg)),+]
    };
}

/// Log at any level, print style.
///
/// # Examples
///
/// ```
/// # use rust_logr::prelude::*;
/// # let logr = Logr::builder().build().unwrap();
/// # let logger = logr.new_logger();
/// log!(logger, Level::INFO, "Simple message");
/// log!(logger, Level::ERROR, "Error code: ", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr $(, $arg:expr)* $(,)?) => {
        $logger.log($level, $crate::args![$($arg),*])
    };
}

/// Log at any level, template style.
///
/// # Examples
///
/// ```
/// # use rust_logr::prelude::*;
/// # let logr = Logr::builder().build().unwrap();
/// # let logger = logr.new_logger();
/// let audit = Level::new(20, "AUDIT", false);
/// logf!(logger, audit, "user {} changed {}", "bob", "password");
/// ```
#[macro_export]
macro_rules! logf {
    ($logger:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.logf($level, $template, $crate::args![$($arg),*])
    };
}

/// Log at any level, line style.
#[macro_export]
macro_rules! logln {
    ($logger:expr, $level:expr $(, $arg:expr)* $(,)?) => {
        $logger.logln($level, $crate::args![$($arg),*])
    };
}

/// Log at TRACE, print style.
#[macro_export]
macro_rules! trace {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.trace($crate::args![$($arg),*])
    };
}

/// Log at TRACE, template style.
#[macro_export]
macro_rules! tracef {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.tracef($template, $crate::args![$($arg),*])
    };
}

/// Log at TRACE, line style.
#[macro_export]
macro_rules! traceln {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.traceln($crate::args![$($arg),*])
    };
}

/// Log at DEBUG, print style.
#[macro_export]
macro_rules! debug {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.debug($crate::args![$($arg),*])
    };
}

/// Log at DEBUG, template style.
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.debugf($template, $crate::args![$($arg),*])
    };
}

/// Log at DEBUG, line style.
#[macro_export]
macro_rules! debugln {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.debugln($crate::args![$($arg),*])
    };
}

/// Log at INFO, print style.
#[macro_export]
macro_rules! info {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.info($crate::args![$($arg),*])
    };
}

/// Log at INFO, template style.
#[macro_export]
macro_rules! infof {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.infof($template, $crate::args![$($arg),*])
    };
}

/// Log at INFO, line style.
#[macro_export]
macro_rules! infoln {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.infoln($crate::args![$($arg),*])
    };
}

/// Log at WARN, print style.
#[macro_export]
macro_rules! warn {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.warn($crate::args![$($arg),*])
    };
}

/// Log at WARN, template style.
#[macro_export]
macro_rules! warnf {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.warnf($template, $crate::args![$($arg),*])
    };
}

/// Log at WARN, line style.
#[macro_export]
macro_rules! warnln {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.warnln($crate::args![$($arg),*])
    };
}

/// Log at ERROR, print style.
#[macro_export]
macro_rules! error {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.error($crate::args![$($arg),*])
    };
}

/// Log at ERROR, template style.
#[macro_export]
macro_rules! errorf {
    ($logger:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $logger.errorf($template, $crate::args![$($arg),*])
    };
}

/// Log at ERROR, line style.
#[macro_export]
macro_rules! errorln {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.errorln($crate::args![$($arg),*])
    };
}
