// Unilog - tests/e2e_merge.rs
//
// End-to-end tests for discovery, segmentation, filtering and merge.
//
// These tests exercise the real filesystem, real walkdir traversal, real
// chrono timestamp parsing and the real binary. No mocks, no stubs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use unilog::app::pipeline::{self, PipelineConfig, RunOutcome};
use unilog::core::discovery::{discover_files, DiscoveryConfig};
use unilog::core::filter::{FilterConfig, FilterSettings};
use unilog::core::matcher::PatternSpec;
use unilog::core::model::LogRecord;
use unilog::core::render::{write_records, OutputFormat};
use unilog::core::timestamp::parse_time_bound;

// =============================================================================
// Helpers
// =============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Discover and merge the fixtures directory with `filter`.
fn run_fixtures(filter: &FilterConfig) -> RunOutcome {
    let (sources, warnings) = discover_files(&fixtures_dir(), &DiscoveryConfig::default()).unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    pipeline::run(&sources, filter, &PipelineConfig::default())
}

fn filter(settings: FilterSettings) -> FilterConfig {
    FilterConfig::new(settings).unwrap()
}

/// `source_id: first line without its timestamp`, one per record.
fn digest(records: impl Iterator<Item = LogRecord>) -> Vec<String> {
    records
        .map(|r| {
            let head = r.lines[0].split_once(' ').map_or("", |(_, rest)| rest);
            format!("{}: {}", r.source_id, head)
        })
        .collect()
}

fn write_log(dir: &Path, name: &str, lines: &[&str]) {
    fs::write(dir.join(name), lines.join("\n")).unwrap();
}

// =============================================================================
// Discovery + merge over fixtures
// =============================================================================

#[test]
fn e2e_discovers_fixture_log_files_only() {
    let (files, _) = discover_files(&fixtures_dir(), &DiscoveryConfig::default()).unwrap();
    let ids: Vec<_> = files.iter().map(|f| f.source_id.as_str()).collect();
    assert_eq!(ids, vec!["service_a.log", "service_b.log"]);
}

#[test]
fn e2e_fixtures_merge_into_one_timeline() {
    let outcome = run_fixtures(&FilterConfig::default());
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.summary.records_accepted, 6);

    let records: Vec<_> = outcome.records.collect();
    assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    assert_eq!(
        digest(records.clone().into_iter()),
        vec![
            "service_a.log: INFO  [main] service-a boot complete",
            "service_b.log: INFO  [main] service-b boot complete",
            "service_a.log: ERROR [worker-3] request 7f3a failed",
            "service_b.log: WARN  [http] slow request 7f3a (912 ms)",
            "service_b.log: error [http] upstream timeout",
            "service_a.log: INFO  [main] service-a shutdown",
        ]
    );

    // The stack trace stays with its record, trimmed.
    assert_eq!(records[2].line_count(), 3);
    assert_eq!(
        records[2].lines[2],
        "at com.example.Handler.handle(Handler.java:42)"
    );
    // Banner line before the first timestamp is not part of any record.
    assert!(records.iter().all(|r| !r.text().contains("starting")));
}

#[test]
fn e2e_case_insensitive_match_pattern() {
    let f = filter(FilterSettings {
        match_patterns: PatternSpec::parse_all(&["-i .*error"]),
        ..Default::default()
    });
    assert_eq!(
        digest(run_fixtures(&f).records),
        vec![
            "service_a.log: ERROR [worker-3] request 7f3a failed",
            "service_b.log: error [http] upstream timeout",
        ]
    );

    let plain = filter(FilterSettings {
        match_patterns: PatternSpec::parse_all(&[".*error"]),
        ..Default::default()
    });
    assert_eq!(
        digest(run_fixtures(&plain).records),
        vec!["service_b.log: error [http] upstream timeout"]
    );
}

#[test]
fn e2e_match_covers_continuation_lines() {
    let f = filter(FilterSettings {
        match_patterns: PatternSpec::parse_all(&["java\\.lang\\."]),
        ..Default::default()
    });
    let records: Vec<_> = run_fixtures(&f).records.collect();
    assert_eq!(records.len(), 1);
    assert!(records[0].lines[0].contains("ERROR"));
}

#[test]
fn e2e_time_window_is_half_open() {
    let f = filter(FilterSettings {
        start_time: Some(parse_time_bound("2021-01-01T00:00:01+00:00").unwrap()),
        end_time: Some(parse_time_bound("2021-01-01T00:00:03+00:00").unwrap()),
        ..Default::default()
    });
    assert_eq!(
        digest(run_fixtures(&f).records),
        vec![
            "service_a.log: ERROR [worker-3] request 7f3a failed",
            "service_b.log: WARN  [http] slow request 7f3a (912 ms)",
            "service_b.log: error [http] upstream timeout",
        ]
    );
}

#[test]
fn e2e_exclude_and_min_lines() {
    let f = filter(FilterSettings {
        exclude_patterns: PatternSpec::parse_all(&["-i .*boot"]),
        ..Default::default()
    });
    assert_eq!(run_fixtures(&f).records.count(), 4);

    let f = filter(FilterSettings {
        min_line_count: Some(3),
        ..Default::default()
    });
    assert_eq!(
        digest(run_fixtures(&f).records),
        vec!["service_a.log: ERROR [worker-3] request 7f3a failed"]
    );
}

#[test]
fn e2e_config_base_and_cli_override_merge() {
    let base = filter(FilterSettings {
        match_patterns: PatternSpec::parse_all(&[".*WARN"]),
        min_line_count: Some(3),
        ..Default::default()
    });
    let over = filter(FilterSettings {
        match_patterns: PatternSpec::parse_all(&["-i .*timeout"]),
        min_line_count: Some(1),
        ..Default::default()
    });
    let merged = FilterConfig::merge(Some(base), Some(over)).unwrap().unwrap();
    assert_eq!(merged.settings().min_line_count, Some(1));
    assert_eq!(merged.settings().match_patterns.len(), 2);
    assert_eq!(
        digest(run_fixtures(&merged).records),
        vec![
            "service_b.log: WARN  [http] slow request 7f3a (912 ms)",
            "service_b.log: error [http] upstream timeout",
        ]
    );
}

// =============================================================================
// Scenarios on temporary directories
// =============================================================================

#[test]
fn e2e_two_file_interleave() {
    let dir = tempfile::tempdir().unwrap();
    write_log(
        dir.path(),
        "a.log",
        &[
            "2021-01-01T00:00:00.000+0000 start",
            "cont",
            "2021-01-01T00:00:00.020+0000 end",
        ],
    );
    write_log(dir.path(), "b.log", &["2021-01-01T00:00:00.010+0000 mid"]);

    let (sources, _) = discover_files(dir.path(), &DiscoveryConfig::default()).unwrap();
    let outcome = pipeline::run(&sources, &FilterConfig::default(), &PipelineConfig::default());
    let records: Vec<_> = outcome.records.collect();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].lines, vec!["2021-01-01T00:00:00.000+0000 start", "cont"]);
    assert_eq!(records[1].lines, vec!["2021-01-01T00:00:00.010+0000 mid"]);
    assert_eq!(records[2].lines, vec!["2021-01-01T00:00:00.020+0000 end"]);
}

#[test]
fn e2e_empty_and_untimestamped_files_yield_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "empty.log", &[]);
    write_log(dir.path(), "plain.log", &["no", "timestamps", "here"]);

    let (sources, _) = discover_files(dir.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(sources.len(), 2);
    let outcome = pipeline::run(&sources, &FilterConfig::default(), &PipelineConfig::default());
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.summary.sources_succeeded, 2);
    assert_eq!(outcome.records.count(), 0);
}

#[test]
fn e2e_large_files_read_through_mmap_merge_the_same() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "a.log", &["2021-01-01T00:00:00.000+0000 a"]);
    write_log(dir.path(), "b.log", &["2021-01-01T00:00:00.001+0000 b"]);

    let config = DiscoveryConfig {
        large_file_threshold: 1,
        ..Default::default()
    };
    let (sources, _) = discover_files(dir.path(), &config).unwrap();
    assert!(sources.iter().all(|s| s.is_large));

    let outcome = pipeline::run(&sources, &FilterConfig::default(), &PipelineConfig { worker_threads: 2 });
    assert_eq!(digest(outcome.records), vec!["a.log: a", "b.log: b"]);
}

#[test]
fn e2e_render_merged_records_as_csv() {
    let outcome = run_fixtures(&FilterConfig::default());
    let mut buf = Vec::new();
    let written = write_records(OutputFormat::Csv, outcome.records, &mut buf, "memory").unwrap();
    assert_eq!(written, 6);

    let mut reader = csv::Reader::from_reader(buf.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 6);
    assert_eq!(&rows[1][0], "2021-01-01T02:00:00.500+02:00");
    assert_eq!(&rows[2][3], "3");
}

// =============================================================================
// Binary
// =============================================================================

/// Run the binary against `dir` with an empty config file.
fn unilog(dir: &Path, args: &[&str]) -> std::process::Output {
    let config_dir = tempfile::tempdir().unwrap();
    let config = config_dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    Command::new(env!("CARGO_BIN_EXE_unilog"))
        .arg(dir)
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn e2e_binary_writes_json_to_stdout() {
    let output = unilog(&fixtures_dir(), &["--format", "json", "-m", "-i .*error"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["source_id"], "service_a.log");
    assert_eq!(records[1]["source_id"], "service_b.log");
}

#[test]
fn e2e_binary_json_and_text_timestamps_agree() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "a.log", &["2021-01-01T00:00:00.000+0000 round second"]);

    let json = unilog(dir.path(), &["--format", "json"]);
    assert!(json.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&json.stdout).unwrap();
    assert_eq!(parsed[0]["timestamp"], "2021-01-01T00:00:00.000+00:00");

    let text = unilog(dir.path(), &[]);
    let stdout = String::from_utf8_lossy(&text.stdout);
    assert!(stdout.starts_with("[a.log] 2021-01-01T00:00:00.000+00:00\n"), "stdout: {stdout}");
}

#[test]
fn e2e_binary_out_of_range_depth_warns_and_falls_back() {
    let output = unilog(&fixtures_dir(), &["--max-depth", "0", "--format", "csv"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_depth = 0 is out of range"), "stderr: {stderr}");

    // Depth falls back to the configured default, so the fixtures are found.
    let mut reader = csv::Reader::from_reader(output.stdout.as_slice());
    assert_eq!(reader.records().count(), 6);
}

#[test]
fn e2e_binary_out_of_range_threads_warns_and_falls_back() {
    let output = unilog(&fixtures_dir(), &["--threads", "10000", "--format", "csv"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("worker_threads = 10000 is out of range"), "stderr: {stderr}");

    let mut reader = csv::Reader::from_reader(output.stdout.as_slice());
    assert_eq!(reader.records().count(), 6);
}

#[test]
fn e2e_binary_reports_skipped_sources_and_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "good.log", &["2021-01-01T00:00:00.000+0000 good"]);
    write_log(dir.path(), "bad.log", &["2021-01-01T25:00:00.000+0000 bad hour"]);

    let output = unilog(dir.path(), &[]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("[good.log] 2021-01-01T00:00:00.000+00:00\n"), "stdout: {stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad.log"), "stderr: {stderr}");
}

#[test]
fn e2e_binary_rejects_invalid_regex() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "a.log", &["2021-01-01T00:00:00.000+0000 a"]);

    let output = unilog(dir.path(), &["--match-pattern", "(unclosed"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn e2e_binary_rejects_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = unilog(&dir.path().join("nope"), &[]);
    assert_eq!(output.status.code(), Some(1));
}
