//! Log level definitions
//!
//! A [`Level`] is a small value type: a numeric id, a display name and
//! whether records at that level carry a stack trace by default. Ids below
//! [`CUSTOM_LEVEL_MIN`] are reserved for the built-in severities; ids from
//! [`CUSTOM_LEVEL_MIN`] up to [`MAX_LEVEL_ID`] are free for applications.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

/// Largest level id a filter can evaluate
pub const MAX_LEVEL_ID: u32 = 256;

/// First id available for application-defined levels
pub const CUSTOM_LEVEL_MIN: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Level {
    id: u32,
    name: &'static str,
    stacktrace: bool,
}

impl Level {
    pub const TRACE: Level = Level::new(0, "TRACE", false);
    pub const DEBUG: Level = Level::new(1, "DEBUG", false);
    pub const INFO: Level = Level::new(2, "INFO", false);
    pub const WARN: Level = Level::new(3, "WARN", false);
    pub const ERROR: Level = Level::new(4, "ERROR", false);
    pub const FATAL: Level = Level::new(5, "FATAL", true);
    pub const PANIC: Level = Level::new(6, "PANIC", true);

    /// Built-in levels in increasing order of severity
    pub const BUILTIN: [Level; 7] = [
        Level::TRACE,
        Level::DEBUG,
        Level::INFO,
        Level::WARN,
        Level::ERROR,
        Level::FATAL,
        Level::PANIC,
    ];

    /// Define a level.
    ///
    /// Construction never fails; an id above [`MAX_LEVEL_ID`] produces a level
    /// that filters report as invalid when it is evaluated.
    ///
    /// ```
    /// use rust_logr::Level;
    ///
    /// const LOGIN: Level = Level::new(100, "login", false);
    /// assert!(LOGIN.is_valid());
    /// assert!(!LOGIN.is_builtin());
    /// ```
    pub const fn new(id: u32, name: &'static str, stacktrace: bool) -> Self {
        Self {
            id,
            name,
            stacktrace,
        }
    }

    /// Define a level whose name is only known at runtime, e.g. read from
    /// configuration.
    ///
    /// Names are interned for the life of the process; defining the same
    /// name again reuses the first copy.
    ///
    /// ```
    /// use rust_logr::Level;
    ///
    /// let name = String::from("audit");
    /// let audit = Level::custom(120, &name, false);
    /// assert_eq!(audit.name(), "audit");
    /// assert_eq!(audit, Level::new(120, "audit", false));
    /// ```
    pub fn custom(id: u32, name: impl AsRef<str>, stacktrace: bool) -> Self {
        Self::new(id, intern(name.as_ref()), stacktrace)
    }

    #[inline]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether records at this level carry a stack trace by default
    #[inline]
    pub const fn stacktrace(&self) -> bool {
        self.stacktrace
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.id <= MAX_LEVEL_ID
    }

    #[inline]
    pub const fn is_builtin(&self) -> bool {
        (self.id as usize) < Self::BUILTIN.len()
    }

    /// Severity ordinal used by threshold filters.
    ///
    /// Only built-in levels have one; application levels are routed by
    /// explicit filters.
    #[inline]
    pub const fn severity(&self) -> Option<u32> {
        if self.is_builtin() {
            Some(self.id)
        } else {
            None
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self.id {
            0 => BrightBlack,
            1 => Blue,
            2 => Green,
            3 => Yellow,
            4 => Red,
            5 | 6 => BrightRed,
            _ => Cyan,
        }
    }
}

fn intern(name: &str) -> &'static str {
    static NAMES: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();

    let mut names = NAMES.get_or_init(Default::default).lock();
    if let Some(&known) = names.get(name) {
        return known;
    }
    let name: &'static str = Box::leak(name.to_owned().into_boxed_str());
    names.insert(name);
    name
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Level {}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(Level::TRACE),
            "DEBUG" => Ok(Level::DEBUG),
            "INFO" => Ok(Level::INFO),
            "WARN" | "WARNING" => Ok(Level::WARN),
            "ERROR" => Ok(Level::ERROR),
            "FATAL" => Ok(Level::FATAL),
            "PANIC" => Ok(Level::PANIC),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
