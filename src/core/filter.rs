//! Per-target level filters
//!
//! A [`Filter`] answers two questions for a level: does the target want
//! records at this level, and must those records carry a stack trace.
//! Evaluation is a pure function of the filter and the level, so filters are
//! shared freely between producer threads.

use super::error::{LoggerError, Result};
use super::level::{Level, MAX_LEVEL_ID};
use std::collections::HashMap;

/// Outcome of evaluating a level against one or more filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelStatus {
    pub enabled: bool,
    pub stacktrace: bool,
}

impl LevelStatus {
    pub const DISABLED: LevelStatus = LevelStatus {
        enabled: false,
        stacktrace: false,
    };

    pub const fn enabled(stacktrace: bool) -> Self {
        Self {
            enabled: true,
            stacktrace,
        }
    }

    /// Fold another target's status into an aggregate.
    ///
    /// Stack traces are only requested on behalf of targets that are enabled.
    pub fn merge(&mut self, other: LevelStatus) {
        if other.enabled {
            self.enabled = true;
            self.stacktrace |= other.stacktrace;
        }
    }
}

#[derive(Debug, Clone)]
pub enum Filter {
    Threshold(ThresholdFilter),
    Explicit(ExplicitFilter),
}

impl Filter {
    /// Enable every built-in level at or above `enabled`, with stack traces at
    /// or above `stacktrace`.
    pub fn threshold(enabled: Level, stacktrace: Level) -> Self {
        Filter::Threshold(ThresholdFilter::new(enabled, stacktrace))
    }

    /// Enable exactly the given levels
    pub fn explicit<I: IntoIterator<Item = Level>>(levels: I) -> Self {
        Filter::Explicit(ExplicitFilter::from_iter(levels))
    }

    /// Every built-in level; stack traces for PANIC only
    pub fn all() -> Self {
        Filter::threshold(Level::TRACE, Level::PANIC)
    }

    /// Nothing is enabled
    pub fn off() -> Self {
        Filter::Threshold(ThresholdFilter::off())
    }

    pub fn evaluate(&self, level: &Level) -> Result<LevelStatus> {
        match self {
            Filter::Threshold(f) => Ok(f.evaluate(level)),
            Filter::Explicit(f) => f.evaluate(level),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::threshold(Level::INFO, Level::PANIC)
    }
}

impl From<ThresholdFilter> for Filter {
    fn from(filter: ThresholdFilter) -> Self {
        Filter::Threshold(filter)
    }
}

impl From<ExplicitFilter> for Filter {
    fn from(filter: ExplicitFilter) -> Self {
        Filter::Explicit(filter)
    }
}

/// Severity threshold over the built-in levels.
///
/// Comparison is by severity ordinal, so `ThresholdFilter::new(WARN, ERROR)`
/// enables WARN, ERROR, FATAL and PANIC. Application-defined levels have no
/// severity and are never enabled by a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdFilter {
    enabled_at: Option<u32>,
    stacktrace_at: Option<u32>,
}

impl ThresholdFilter {
    pub fn new(enabled: Level, stacktrace: Level) -> Self {
        Self {
            enabled_at: enabled.severity(),
            stacktrace_at: stacktrace.severity(),
        }
    }

    pub const fn off() -> Self {
        Self {
            enabled_at: None,
            stacktrace_at: None,
        }
    }

    pub fn evaluate(&self, level: &Level) -> LevelStatus {
        let (Some(severity), Some(enabled_at)) = (level.severity(), self.enabled_at) else {
            return LevelStatus::DISABLED;
        };
        if severity < enabled_at {
            return LevelStatus::DISABLED;
        }
        let stacktrace = self.stacktrace_at.is_some_and(|at| severity >= at);
        LevelStatus::enabled(stacktrace)
    }
}

/// Set of individually registered levels.
///
/// Registration never fails, even for ids beyond [`MAX_LEVEL_ID`]; evaluating
/// such a level returns [`LoggerError::InvalidLevelId`] instead.
#[derive(Debug, Clone, Default)]
pub struct ExplicitFilter {
    levels: HashMap<u32, Level>,
}

impl ExplicitFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, level: Level) {
        self.levels.insert(level.id(), level);
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level(mut self, level: Level) -> Self {
        self.add(level);
        self
    }

    pub fn contains(&self, level: &Level) -> bool {
        self.levels.contains_key(&level.id())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn evaluate(&self, level: &Level) -> Result<LevelStatus> {
        if !level.is_valid() {
            return Err(LoggerError::invalid_level_id(level.id(), MAX_LEVEL_ID));
        }
        Ok(match self.levels.get(&level.id()) {
            Some(registered) => LevelStatus::enabled(registered.stacktrace()),
            None => LevelStatus::DISABLED,
        })
    }
}

impl FromIterator<Level> for ExplicitFilter {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        let mut filter = ExplicitFilter::new();
        for level in iter {
            filter.add(level);
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: Level = Level::new(100, "login", false);
    const LOGOUT: Level = Level::new(101, "logout", true);
    const BAD: Level = Level::new(MAX_LEVEL_ID + 1, "invalid", false);

    #[test]
    fn test_threshold_warn() {
        let filter = Filter::threshold(Level::WARN, Level::ERROR);
        let enabled: Vec<&str> = Level::BUILTIN
            .iter()
            .filter(|l| filter.evaluate(l).unwrap().enabled)
            .map(|l| l.name())
            .collect();
        assert_eq!(enabled, vec!["WARN", "ERROR", "FATAL", "PANIC"]);
    }

    #[test]
    fn test_threshold_stacktrace() {
        let filter = ThresholdFilter::new(Level::DEBUG, Level::ERROR);
        assert_eq!(filter.evaluate(&Level::WARN), LevelStatus::enabled(false));
        assert_eq!(filter.evaluate(&Level::ERROR), LevelStatus::enabled(true));
        assert_eq!(filter.evaluate(&Level::TRACE), LevelStatus::DISABLED);
    }

    #[test]
    fn test_threshold_ignores_custom_levels() {
        let filter = Filter::all();
        assert!(!filter.evaluate(&LOGIN).unwrap().enabled);
        assert!(!filter.evaluate(&BAD).unwrap().enabled);
    }

    #[test]
    fn test_off() {
        let filter = Filter::off();
        assert!(Level::BUILTIN
            .iter()
            .all(|l| !filter.evaluate(l).unwrap().enabled));
    }

    #[test]
    fn test_explicit_exact_match() {
        let filter = Filter::explicit([LOGIN, LOGOUT]);
        assert_eq!(filter.evaluate(&LOGIN).unwrap(), LevelStatus::enabled(false));
        assert_eq!(filter.evaluate(&LOGOUT).unwrap(), LevelStatus::enabled(true));
        assert!(!filter.evaluate(&Level::ERROR).unwrap().enabled);
        assert!(!filter.evaluate(&Level::DEBUG).unwrap().enabled);
    }

    #[test]
    fn test_explicit_invalid_level() {
        let mut filter = ExplicitFilter::new();
        filter.add(BAD);
        assert_eq!(filter.len(), 1);

        let err = filter.evaluate(&BAD).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevelId { id, max } if id == MAX_LEVEL_ID + 1 && max == MAX_LEVEL_ID));
    }

    #[test]
    fn test_status_merge() {
        let mut status = LevelStatus::DISABLED;
        status.merge(LevelStatus {
            enabled: false,
            stacktrace: true,
        });
        assert_eq!(status, LevelStatus::DISABLED);

        status.merge(LevelStatus::enabled(false));
        status.merge(LevelStatus::enabled(true));
        assert_eq!(status, LevelStatus::enabled(true));
    }
}
