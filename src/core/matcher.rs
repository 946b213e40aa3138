// Unilog - core/matcher.rs
//
// Boolean line predicates: constants, anchored regex patterns, and AND/OR
// combinators over them. Trees are built once from configuration and then
// shared read-only across worker threads.

use crate::util::constants::{CASE_INSENSITIVE_PREFIX, MAX_REGEX_PATTERN_LENGTH};
use crate::util::error::MatcherError;
use regex::{Regex, RegexBuilder};
use std::fmt;

// =============================================================================
// Pattern specs (user input, already stripped of the string convention)
// =============================================================================

/// One user-supplied pattern with its case flag.
///
/// Configuration marks case-insensitive patterns with a leading `"-i "`;
/// `parse` turns that into the flag so nothing downstream sees the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    pub pattern: String,
    pub case_insensitive: bool,
}

impl PatternSpec {
    pub fn new(pattern: impl Into<String>, case_insensitive: bool) -> Self {
        Self {
            pattern: pattern.into(),
            case_insensitive,
        }
    }

    /// Parse a raw configuration string, e.g. `"-i error"` or `"WARN"`.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(CASE_INSENSITIVE_PREFIX) {
            Some(rest) => Self::new(rest, true),
            None => Self::new(raw, false),
        }
    }

    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Vec<Self> {
        raw.iter().map(|s| Self::parse(s.as_ref())).collect()
    }
}

// =============================================================================
// Matcher tree
// =============================================================================

/// How a combinator folds its children's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub fn label(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }
}

/// A predicate over a single line of text.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches every line.
    Always,

    /// Matches no line.
    Never,

    /// Regex that must match starting at the first character of the line.
    /// It need not consume the whole line.
    Pattern {
        /// The pattern as the user wrote it, for display.
        source: String,
        regex: Regex,
        case_insensitive: bool,
    },

    /// AND/OR over a non-empty, ordered list of children.
    Combinator {
        operator: Operator,
        children: Vec<Matcher>,
    },
}

impl Matcher {
    /// Compile a left-anchored pattern.
    pub fn pattern(pattern: &str, case_insensitive: bool) -> Result<Self, MatcherError> {
        check_length(pattern)?;
        Self::compile(pattern, case_insensitive)
    }

    fn compile(pattern: &str, case_insensitive: bool) -> Result<Self, MatcherError> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})"))
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| MatcherError::InvalidRegex {
                pattern: pattern.to_string(),
                source: e,
            })?;
        Ok(Self::Pattern {
            source: pattern.to_string(),
            regex,
            case_insensitive,
        })
    }

    /// Build a combinator. Fails on an empty child list.
    pub fn combine(operator: Operator, children: Vec<Matcher>) -> Result<Self, MatcherError> {
        if children.is_empty() {
            return Err(MatcherError::EmptyCombinator {
                operator: operator.label(),
            });
        }
        Ok(Self::Combinator { operator, children })
    }

    pub fn any_of(children: Vec<Matcher>) -> Result<Self, MatcherError> {
        Self::combine(Operator::Or, children)
    }

    pub fn all_of(children: Vec<Matcher>) -> Result<Self, MatcherError> {
        Self::combine(Operator::And, children)
    }

    /// Build a matcher from a flat list of user patterns.
    ///
    /// Patterns are partitioned by case flag and each partition becomes a
    /// single alternation. With both partitions present the two results are
    /// OR-ed. Returns `Ok(None)` for an empty list; the caller picks the
    /// default (`Always` for inclusion, `Never` for exclusion).
    pub fn from_specs(specs: &[PatternSpec]) -> Result<Option<Self>, MatcherError> {
        let (insensitive, sensitive): (Vec<&PatternSpec>, Vec<&PatternSpec>) =
            specs.iter().partition(|s| s.case_insensitive);

        let mut parts = Vec::with_capacity(2);
        for (group, case_insensitive) in [(sensitive, false), (insensitive, true)] {
            if group.is_empty() {
                continue;
            }
            for spec in &group {
                check_length(&spec.pattern)?;
                // Compile each piece alone first so an error names the
                // offending pattern rather than the joined alternation.
                Regex::new(&spec.pattern).map_err(|e| MatcherError::InvalidRegex {
                    pattern: spec.pattern.clone(),
                    source: e,
                })?;
            }
            let joined = group
                .iter()
                .map(|s| format!("(?:{})", s.pattern))
                .collect::<Vec<_>>()
                .join("|");
            // The joined alternation may exceed the per-pattern length limit.
            parts.push(Self::compile(&joined, case_insensitive)?);
        }

        match parts.len() {
            0 => Ok(None),
            1 => Ok(parts.pop()),
            _ => Self::any_of(parts).map(Some),
        }
    }

    /// Evaluate against one line. Combinators short-circuit.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Always => true,
            Matcher::Never => false,
            Matcher::Pattern { regex, .. } => regex.is_match(line),
            Matcher::Combinator {
                operator: Operator::Or,
                children,
            } => children.iter().any(|c| c.matches(line)),
            Matcher::Combinator {
                operator: Operator::And,
                children,
            } => children.iter().all(|c| c.matches(line)),
        }
    }

    /// True if any of `lines` matches.
    pub fn matches_any<S: AsRef<str>>(&self, lines: &[S]) -> bool {
        match self {
            Matcher::Always => !lines.is_empty(),
            Matcher::Never => false,
            _ => lines.iter().any(|l| self.matches(l.as_ref())),
        }
    }
}

fn check_length(pattern: &str) -> Result<(), MatcherError> {
    if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
        return Err(MatcherError::PatternTooLong {
            length: pattern.len(),
            max_length: MAX_REGEX_PATTERN_LENGTH,
        });
    }
    Ok(())
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Always => f.write_str("AlwaysMatcher"),
            Matcher::Never => f.write_str("NeverMatcher"),
            Matcher::Pattern {
                source,
                case_insensitive: true,
                ..
            } => write!(f, "[(?i){source}]"),
            Matcher::Pattern { source, .. } => write!(f, "[{source}]"),
            Matcher::Combinator { operator, children } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", operator.label())?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
