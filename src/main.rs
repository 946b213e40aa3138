// Unilog - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation (debug mode support)
// 3. Filter assembly: config file as base, CLI flags layered on top
// 4. Discovery, parallel segmentation, merge and output

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use unilog::app::pipeline::{self, PipelineConfig};
use unilog::core::discovery::{self, DiscoveryConfig};
use unilog::core::filter::{FilterConfig, FilterSettings};
use unilog::core::matcher::PatternSpec;
use unilog::core::model::Timestamp;
use unilog::core::render::{self, OutputFormat};
use unilog::core::timestamp::parse_time_bound;
use unilog::platform::config::{self, AppConfig};
use unilog::util::{self, error::RenderError};

/// Unilog - merge log files from one directory into a single timeline.
///
/// Every record (a timestamped line plus its continuation lines) from every
/// matching file is filtered and written out in timestamp order.
#[derive(Parser, Debug)]
#[command(name = "unilog", version, about)]
struct Cli {
    /// Directory containing the log files.
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// Keep records at or after this time (e.g. 2021-12-01T00:00:00+00:00).
    #[arg(short = 's', long = "start-time", value_parser = parse_time_bound)]
    start_time: Option<Timestamp>,

    /// Keep records strictly before this time.
    #[arg(short = 'e', long = "end-time", value_parser = parse_time_bound)]
    end_time: Option<Timestamp>,

    /// Keep records with a line matching this regex. Prefix "-i " to ignore case.
    #[arg(short = 'm', long = "match-pattern", allow_hyphen_values = true)]
    match_patterns: Vec<String>,

    /// Drop records with a line matching this regex. Prefix "-i " to ignore case.
    #[arg(short = 'x', long = "exclude-pattern", allow_hyphen_values = true)]
    exclude_patterns: Vec<String>,

    /// Drop records with fewer lines than this.
    #[arg(short = 'n', long = "min-lines")]
    min_lines: Option<usize>,

    /// File name glob to include (replaces the configured list).
    #[arg(long = "include")]
    include: Vec<String>,

    /// File or directory name glob to exclude (replaces the configured list).
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Directory recursion depth; 1 = only the directory's own files.
    #[arg(long = "max-depth")]
    max_depth: Option<usize>,

    /// Output format: text, json or csv.
    #[arg(short = 'f', long = "format")]
    format: Option<OutputFormat>,

    /// Write output to this file instead of stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Worker threads for reading files (0 = one per core).
    #[arg(short = 'j', long = "threads")]
    threads: Option<usize>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

impl Cli {
    /// The filter criteria given on the command line.
    fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            start_time: self.start_time,
            end_time: self.end_time,
            match_patterns: PatternSpec::parse_all(&self.match_patterns),
            exclude_patterns: PatternSpec::parse_all(&self.exclude_patterns),
            min_line_count: self.min_lines,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Config is loaded before logging so its [logging] level can apply.
    let loaded = match &cli.config {
        Some(path) => config::load_config(path, true),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, false),
            None => Ok((AppConfig::default(), Vec::new())),
        },
    };
    let (app_config, config_warnings) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "Unilog starting"
    );

    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    if let Err(e) = execute(&cli, app_config) {
        tracing::error!(error = %e, "Run failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn execute(cli: &Cli, app_config: AppConfig) -> util::error::Result<()> {
    // Matchers are compiled here, before any file is touched.
    let base = FilterConfig::new(app_config.filter)?;
    let over = FilterConfig::new(cli.filter_settings())?;
    let filter = FilterConfig::merge(Some(base), Some(over))?.unwrap_or_default();
    tracing::debug!(
        settings = ?filter.settings(),
        unfiltered = filter.is_unfiltered(),
        "Effective filter"
    );

    let discovery_config = DiscoveryConfig {
        max_depth: checked_flag(
            "--max-depth",
            cli.max_depth,
            config::check_max_depth,
            app_config.max_depth,
        ),
        include_patterns: if cli.include.is_empty() {
            app_config.include_patterns
        } else {
            cli.include.clone()
        },
        exclude_patterns: if cli.exclude.is_empty() {
            app_config.exclude_patterns
        } else {
            cli.exclude.clone()
        },
        large_file_threshold: app_config.large_file_threshold,
    };

    let (sources, discovery_warnings) = discovery::discover_files(&cli.directory, &discovery_config)?;
    for warning in &discovery_warnings {
        tracing::warn!(warning = %warning, "Discovery warning");
    }
    if sources.is_empty() {
        tracing::warn!(directory = %cli.directory.display(), "No log files found");
    }

    let pipeline_config = PipelineConfig {
        worker_threads: checked_flag(
            "--threads",
            cli.threads,
            config::check_worker_threads,
            app_config.worker_threads,
        ),
    };
    let outcome = pipeline::run(&sources, &filter, &pipeline_config);

    let format = cli.format.unwrap_or(app_config.output_format);
    let output_path = cli.output.clone().or(app_config.output_path);

    let written = match &output_path {
        Some(path) => {
            let destination = path.display().to_string();
            let file = std::fs::File::create(path).map_err(|e| RenderError::Io {
                destination: destination.clone(),
                source: e,
            })?;
            render::write_records(format, outcome.records, file, &destination)?
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            let count = render::write_records(format, outcome.records, &mut lock, "stdout")?;
            lock.flush().map_err(|e| RenderError::Io {
                destination: "stdout".to_string(),
                source: e,
            })?;
            count
        }
    };

    // Failures are reported once, after the output, so they are not lost
    // among rendered records.
    if !outcome.failures.is_empty() {
        eprintln!(
            "{} of {} source(s) skipped:",
            outcome.failures.len(),
            outcome.summary.sources_attempted
        );
        for failure in &outcome.failures {
            eprintln!("  {}: {}", failure.source_id, failure.error);
        }
    }

    tracing::info!(
        sources = outcome.summary.sources_attempted,
        failed = outcome.summary.sources_failed,
        records = written,
        format = %format,
        "Run complete"
    );

    Ok(())
}

/// A numeric flag run through the same range check as its config key.
/// Out of range warns and keeps the configured value.
fn checked_flag(
    flag: &str,
    value: Option<usize>,
    check: fn(usize) -> Result<usize, String>,
    configured: usize,
) -> usize {
    match value.map(check) {
        None => configured,
        Some(Ok(value)) => value,
        Some(Err(reason)) => {
            tracing::warn!(
                flag,
                reason = %reason,
                fallback = configured,
                "Ignoring out-of-range flag"
            );
            configured
        }
    }
}
