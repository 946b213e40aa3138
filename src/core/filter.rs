// Unilog - core/filter.rs
//
// Record acceptance: time window, inclusion/exclusion matchers and a
// minimum line count, all AND-combined.
// Core layer: pure logic, no I/O.

use crate::core::matcher::{Matcher, PatternSpec};
use crate::core::model::{LogRecord, Timestamp};
use crate::util::error::MatcherError;

/// Raw filter criteria as a configuration source supplies them.
///
/// Every scalar is optional so "not configured" stays distinct from a
/// configured zero when two sources are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSettings {
    /// Inclusive lower bound. None = unbounded.
    pub start_time: Option<Timestamp>,

    /// Exclusive upper bound. None = unbounded.
    pub end_time: Option<Timestamp>,

    /// A record is kept only if one of its lines matches one of these.
    /// Empty = keep everything.
    pub match_patterns: Vec<PatternSpec>,

    /// A record is dropped if one of its lines matches one of these.
    /// Empty = drop nothing.
    pub exclude_patterns: Vec<PatternSpec>,

    /// Minimum lines per record. None = 0.
    pub min_line_count: Option<usize>,
}

/// Resolved, immutable filter. Built once per run and shared read-only by
/// every segmentation worker.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    settings: FilterSettings,
    inclusion: Matcher,
    exclusion: Matcher,
}

impl FilterConfig {
    /// Compile the matchers for `settings`.
    pub fn new(settings: FilterSettings) -> Result<Self, MatcherError> {
        let inclusion = Matcher::from_specs(&settings.match_patterns)?.unwrap_or(Matcher::Always);
        let exclusion = Matcher::from_specs(&settings.exclude_patterns)?.unwrap_or(Matcher::Never);
        tracing::debug!(
            start = ?settings.start_time,
            end = ?settings.end_time,
            min_lines = ?settings.min_line_count,
            inclusion = %inclusion,
            exclusion = %exclusion,
            "Filter built"
        );
        Ok(Self {
            settings,
            inclusion,
            exclusion,
        })
    }

    /// A filter that keeps every record.
    pub fn unfiltered() -> Self {
        Self {
            settings: FilterSettings::default(),
            inclusion: Matcher::Always,
            exclusion: Matcher::Never,
        }
    }

    /// Layer `over` on top of `base`.
    ///
    /// Scalars come from `over` when it sets them, otherwise from `base`.
    /// Pattern lists are concatenated (base first) and the matchers rebuilt
    /// from the combined lists. An absent side yields the other unchanged;
    /// two absent sides yield `None`.
    pub fn merge(
        base: Option<FilterConfig>,
        over: Option<FilterConfig>,
    ) -> Result<Option<Self>, MatcherError> {
        let (base, over) = match (base, over) {
            (None, None) => return Ok(None),
            (Some(only), None) | (None, Some(only)) => return Ok(Some(only)),
            (Some(base), Some(over)) => (base.settings, over.settings),
        };

        let mut match_patterns = base.match_patterns;
        match_patterns.extend(over.match_patterns);
        let mut exclude_patterns = base.exclude_patterns;
        exclude_patterns.extend(over.exclude_patterns);

        Self::new(FilterSettings {
            start_time: over.start_time.or(base.start_time),
            end_time: over.end_time.or(base.end_time),
            match_patterns,
            exclude_patterns,
            min_line_count: over.min_line_count.or(base.min_line_count),
        })
        .map(Some)
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.settings.start_time
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.settings.end_time
    }

    pub fn min_line_count(&self) -> usize {
        self.settings.min_line_count.unwrap_or(0)
    }

    pub fn inclusion(&self) -> &Matcher {
        &self.inclusion
    }

    pub fn exclusion(&self) -> &Matcher {
        &self.exclusion
    }

    /// Returns true if no criterion is configured.
    pub fn is_unfiltered(&self) -> bool {
        self.settings.start_time.is_none()
            && self.settings.end_time.is_none()
            && self.settings.match_patterns.is_empty()
            && self.settings.exclude_patterns.is_empty()
            && self.min_line_count() == 0
    }

    /// `start_time <= ts < end_time`, each side only when configured.
    pub fn in_window(&self, ts: Timestamp) -> bool {
        if let Some(start) = self.settings.start_time {
            if ts < start {
                return false;
            }
        }
        if let Some(end) = self.settings.end_time {
            if ts >= end {
                return false;
            }
        }
        true
    }

    /// The single keep/drop decision for a completed record.
    pub fn accepts(&self, record: &LogRecord) -> bool {
        // Cheap checks first; the result is the same in any order.
        record.line_count() >= self.min_line_count()
            && self.in_window(record.timestamp)
            && self.inclusion.matches_any(&record.lines)
            && !self.exclusion.matches_any(&record.lines)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::unfiltered()
    }
}

// =============================================================================
// Tests
// =============================================================================
