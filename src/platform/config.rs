// Unilog - platform/config.rs
//
// config.toml resolution, loading and validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.
//
// Out-of-range scalars produce warnings and fall back to defaults.
// Values that would change *which* records are emitted (time bounds, output
// format) are fatal when invalid.

use crate::core::filter::FilterSettings;
use crate::core::matcher::PatternSpec;
use crate::core::model::Timestamp;
use crate::core::render::OutputFormat;
use crate::core::timestamp::parse_time_bound;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Platform location of `config.toml`, if one can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    match ProjectDirs::from("", "", constants::APP_ID) {
        Some(dirs) => {
            let path = dirs.config_dir().join(constants::CONFIG_FILE_NAME);
            tracing::debug!(path = %path.display(), "Default config path resolved");
            Some(path)
        }
        None => {
            tracing::warn!("Could not determine platform config directory");
            None
        }
    }
}

// =============================================================================
// Raw shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub filter: FilterSection,
    pub discovery: DiscoverySection,
    pub parsing: ParsingSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

/// `[filter]` config section. Becomes the base filter the CLI layers onto.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Regexes, `-i ` prefix for case-insensitive.
    pub match_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
    pub min_line_count: Option<usize>,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Maximum directory recursion depth.
    pub max_depth: Option<usize>,
    /// Include glob patterns.
    pub include_patterns: Option<Vec<String>>,
    /// Exclude glob patterns.
    pub exclude_patterns: Option<Vec<String>>,
}

/// `[parsing]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ParsingSection {
    /// Number of worker threads (0 = auto).
    pub worker_threads: Option<usize>,
    /// Files at or above this size are memory-mapped.
    pub large_file_threshold_bytes: Option<u64>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// "text", "json" or "csv".
    pub format: Option<String>,
    /// Output file; absent = stdout.
    pub path: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

// =============================================================================
// Validated configuration
// =============================================================================

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Filter --
    /// Base filter criteria; the CLI's criteria are merged on top.
    pub filter: FilterSettings,

    // -- Discovery --
    pub max_depth: usize,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    // -- Parsing --
    /// 0 = one per CPU core.
    pub worker_threads: usize,
    pub large_file_threshold: u64,

    // -- Output --
    pub output_format: OutputFormat,
    pub output_path: Option<PathBuf>,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            filter: FilterSettings::default(),
            max_depth: constants::DEFAULT_MAX_DEPTH,
            include_patterns: to_strings(constants::DEFAULT_INCLUDE_PATTERNS),
            exclude_patterns: to_strings(constants::DEFAULT_EXCLUDE_PATTERNS),
            worker_threads: constants::DEFAULT_WORKER_THREADS,
            large_file_threshold: constants::DEFAULT_LARGE_FILE_THRESHOLD,
            output_format: OutputFormat::default(),
            output_path: None,
            log_level: None,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// =============================================================================
// Loading
// =============================================================================

/// Load and validate `config.toml` at `path`.
///
/// A missing file yields defaults unless `must_exist` is set (an explicit
/// `--config` path). Returns the validated config and non-fatal warnings.
pub fn load_config(path: &Path, must_exist: bool) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !must_exist => {
            tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
            return Ok((AppConfig::default(), Vec::new()));
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "Loaded config.toml");
    validate(raw)
}

/// Turn a raw config into an `AppConfig`, accumulating warnings.
pub fn validate(raw: RawConfig) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Filter --
    config.filter = FilterSettings {
        start_time: parse_bound("[filter] start_time", raw.filter.start_time)?,
        end_time: parse_bound("[filter] end_time", raw.filter.end_time)?,
        match_patterns: raw
            .filter
            .match_patterns
            .map(|p| PatternSpec::parse_all(&p))
            .unwrap_or_default(),
        exclude_patterns: raw
            .filter
            .exclude_patterns
            .map(|p| PatternSpec::parse_all(&p))
            .unwrap_or_default(),
        min_line_count: raw.filter.min_line_count,
    };

    if let (Some(start), Some(end)) = (config.filter.start_time, config.filter.end_time) {
        if start >= end {
            warnings.push(format!(
                "[filter] start_time ({start}) is not before end_time ({end}); no record can match."
            ));
        }
    }

    // -- Discovery: max_depth --
    if let Some(depth) = raw.discovery.max_depth {
        match check_max_depth(depth) {
            Ok(depth) => config.max_depth = depth,
            Err(reason) => warnings.push(format!(
                "[discovery] {reason}. Using default ({}).",
                constants::DEFAULT_MAX_DEPTH,
            )),
        }
    }

    if let Some(include) = raw.discovery.include_patterns {
        config.include_patterns = include;
    }
    if let Some(exclude) = raw.discovery.exclude_patterns {
        config.exclude_patterns = exclude;
    }

    // -- Parsing --
    if let Some(threads) = raw.parsing.worker_threads {
        match check_worker_threads(threads) {
            Ok(threads) => config.worker_threads = threads,
            Err(reason) => warnings.push(format!("[parsing] {reason}. Using default (auto).")),
        }
    }

    if let Some(threshold) = raw.parsing.large_file_threshold_bytes {
        if threshold > 0 {
            config.large_file_threshold = threshold;
        } else {
            warnings.push(format!(
                "[parsing] large_file_threshold_bytes must be positive. Using default ({}).",
                constants::DEFAULT_LARGE_FILE_THRESHOLD,
            ));
        }
    }

    // -- Output --
    if let Some(format) = raw.output.format {
        config.output_format =
            format
                .parse::<OutputFormat>()
                .map_err(|expected| ConfigError::InvalidValue {
                    field: "[output] format".to_string(),
                    value: format.clone(),
                    expected,
                })?;
    }

    if let Some(path) = raw.output.path {
        if !path.is_empty() {
            config.output_path = Some(PathBuf::from(path));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    Ok((config, warnings))
}

/// Range check for a discovery depth, shared by `[discovery] max_depth` and
/// `--max-depth`. The error is a message fragment naming the value.
pub fn check_max_depth(depth: usize) -> Result<usize, String> {
    if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
        Ok(depth)
    } else {
        Err(format!(
            "max_depth = {depth} is out of range (1-{})",
            constants::ABSOLUTE_MAX_DEPTH
        ))
    }
}

/// Range check for the worker count, shared by `[parsing] worker_threads`
/// and `--threads`. 0 = auto.
pub fn check_worker_threads(threads: usize) -> Result<usize, String> {
    if threads <= constants::MAX_WORKER_THREADS {
        Ok(threads)
    } else {
        Err(format!(
            "worker_threads = {threads} is out of range (0-{})",
            constants::MAX_WORKER_THREADS
        ))
    }
}

fn parse_bound(
    field: &str,
    value: Option<String>,
) -> Result<Option<Timestamp>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => parse_time_bound(&v)
            .map(Some)
            .map_err(|source| ConfigError::InvalidTimestamp {
                field: field.to_string(),
                value: v,
                source,
            }),
    }
}

// =============================================================================
// Tests
// =============================================================================
