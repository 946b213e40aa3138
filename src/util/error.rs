// Unilog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every subsystem owns its error enum. Those that can end a run convert
// into `UnilogError`; `ParseError` only ever reaches the caller wrapped in
// `SourceError::Inconsistent`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all Unilog operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum UnilogError {
    /// Matcher construction failed (bad pattern, empty combinator).
    Matcher(MatcherError),

    /// A log source could not be read.
    Source(SourceError),

    /// File discovery failed.
    Discovery(DiscoveryError),

    /// Rendering merged records failed.
    Render(RenderError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for UnilogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matcher(e) => write!(f, "Matcher error: {e}"),
            Self::Source(e) => write!(f, "Source error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Render(e) => write!(f, "Render error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for UnilogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Matcher(e) => Some(e),
            Self::Source(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Render(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Matcher errors
// ---------------------------------------------------------------------------

/// Errors raised while building a matcher tree. Always fatal, and always
/// raised before any file is read.
#[derive(Debug)]
pub enum MatcherError {
    /// A user-supplied pattern is not a valid regex.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    /// A pattern exceeds the maximum allowed length.
    PatternTooLong { length: usize, max_length: usize },

    /// An AND/OR combinator was given no children.
    EmptyCombinator { operator: &'static str },
}

impl fmt::Display for MatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid filter regex '{pattern}': {source}")
            }
            Self::PatternTooLong { length, max_length } => write!(
                f,
                "Filter pattern is {length} chars, exceeds maximum of {max_length}"
            ),
            Self::EmptyCombinator { operator } => {
                write!(f, "{operator} matcher requires at least one child")
            }
        }
    }
}

impl std::error::Error for MatcherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<MatcherError> for UnilogError {
    fn from(e: MatcherError) -> Self {
        Self::Matcher(e)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// A substring matched the record timestamp pattern but chrono rejected it
/// (e.g. month 13). Distinct from the ordinary "no timestamp on this line".
#[derive(Debug)]
pub enum ParseError {
    TimestampInconsistent {
        source_id: String,
        line_number: u64,
        raw: String,
        source: chrono::ParseError,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampInconsistent {
                source_id,
                line_number,
                raw,
                source,
            } => write!(
                f,
                "'{source_id}' line {line_number}: '{raw}' looks like a timestamp \
                 but cannot be parsed: {source}"
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TimestampInconsistent { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Source errors
// ---------------------------------------------------------------------------

/// Per-source failures. These never abort a run; the pipeline records them
/// and keeps merging the remaining sources.
#[derive(Debug)]
pub enum SourceError {
    /// The file could not be opened or read.
    Unreadable { path: PathBuf, source: io::Error },

    /// The file's record stream was cut short by a parse inconsistency.
    Inconsistent(ParseError),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, source } => {
                write!(f, "Cannot read '{}': {source}", path.display())
            }
            Self::Inconsistent(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            Self::Inconsistent(e) => Some(e),
        }
    }
}

impl From<ParseError> for SourceError {
    fn from(e: ParseError) -> Self {
        Self::Inconsistent(e)
    }
}

impl From<SourceError> for UnilogError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to file discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The root scan path does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },

    /// Permission denied accessing the root path.
    PermissionDenied { path: PathBuf, source: io::Error },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Log directory '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Log path '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for UnilogError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Render errors
// ---------------------------------------------------------------------------

/// Errors related to writing merged records out.
#[derive(Debug)]
pub enum RenderError {
    /// I/O error writing to the destination.
    Io { destination: String, source: io::Error },

    /// CSV serialisation error.
    Csv {
        destination: String,
        source: csv::Error,
    },

    /// JSON serialisation error.
    Json {
        destination: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                destination,
                source,
            } => write!(f, "Output I/O error '{destination}': {source}"),
            Self::Csv {
                destination,
                source,
            } => write!(f, "CSV output error '{destination}': {source}"),
            Self::Json {
                destination,
                source,
            } => write!(f, "JSON output error '{destination}': {source}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<RenderError> for UnilogError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A time bound could not be parsed.
    InvalidTimestamp {
        field: String,
        value: String,
        source: chrono::ParseError,
    },

    /// A config value is not one of the accepted choices.
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::InvalidTimestamp {
                field,
                value,
                source,
            } => write!(
                f,
                "'{field}' = '{value}' is not a valid time ({source}). \
                 Try the format 2021-12-01T00:00:00+00:00"
            ),
            Self::InvalidValue {
                field,
                value,
                expected,
            } => write!(f, "'{field}' = '{value}' is not valid. Expected: {expected}"),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidTimestamp { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for UnilogError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for Unilog results.
pub type Result<T> = std::result::Result<T, UnilogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_source_error_preserves_parse_chain() {
        let source = chrono::DateTime::parse_from_str("bad", "%Y").unwrap_err();
        let parse = ParseError::TimestampInconsistent {
            source_id: "a.log".to_string(),
            line_number: 3,
            raw: "2021-13-01T00:00:00.000+0000".to_string(),
            source,
        };
        let err: UnilogError = SourceError::from(parse).into();

        let msg = err.to_string();
        assert!(msg.contains("a.log"), "got: {msg}");
        assert!(msg.contains("line 3"), "got: {msg}");

        let level1 = err.source().expect("SourceError");
        let level2 = level1.source().expect("ParseError");
        assert!(level2.source().is_some(), "chrono error should be kept");
    }

    #[test]
    fn test_empty_combinator_message_names_operator() {
        let err = MatcherError::EmptyCombinator { operator: "AND" };
        assert_eq!(err.to_string(), "AND matcher requires at least one child");
    }
}
