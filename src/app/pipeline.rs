// Unilog - app/pipeline.rs
//
// Run orchestration: read and segment every source in parallel, then hand
// the per-source record lists to the k-way merge.
//
//   - Each source is processed independently on a rayon worker; the only
//     shared state is the read-only FilterConfig.
//   - Per-source failures never abort the run. They are collected in source
//     order and the failed source contributes no records.
//   - The merge itself is lazy and runs on the caller's thread.

use crate::core::filter::FilterConfig;
use crate::core::merge::{merge, MergedRecords};
use crate::core::model::{LogRecord, RunSummary, SourceFile, SourceSummary};
use crate::core::segment::segment;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::SourceError;
use rayon::prelude::*;
use std::time::Instant;

/// Tuning for a run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Worker threads for reading and segmentation. 0 = rayon's global pool.
    pub worker_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_threads: constants::DEFAULT_WORKER_THREADS,
        }
    }
}

/// A source that contributed nothing because it failed.
#[derive(Debug)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: SourceError,
}

/// The merged stream of one run, per-source records already filtered.
pub type RecordStream = MergedRecords<std::vec::IntoIter<LogRecord>>;

/// Everything a run produces.
pub struct RunOutcome {
    /// Accepted records in timestamp order. Consumed lazily.
    pub records: RecordStream,

    /// Failed sources, in source order.
    pub failures: Vec<SourceFailure>,

    pub summary: RunSummary,
}

/// Read, segment and filter `sources`, then merge them.
///
/// Source order is the merge's tie-break order.
pub fn run(sources: &[SourceFile], filter: &FilterConfig, config: &PipelineConfig) -> RunOutcome {
    let started = Instant::now();
    tracing::info!(
        sources = sources.len(),
        workers = config.worker_threads,
        "Run starting"
    );

    let process_all = || -> Vec<Result<Vec<LogRecord>, SourceError>> {
        sources
            .par_iter()
            .map(|file| process_file(file, filter))
            .collect()
    };

    let results = match build_pool(config.worker_threads) {
        Some(pool) => pool.install(process_all),
        None => process_all(),
    };

    let ids = sources.iter().map(|f| f.source_id.clone());
    assemble(ids.zip(results), started)
}

/// Same as [`run`] over in-memory `(source_id, lines)` pairs, processed on
/// the calling thread. For callers that enumerate sources themselves.
pub fn merge_line_sources<I, L, S>(sources: I, filter: &FilterConfig) -> RunOutcome
where
    I: IntoIterator<Item = (String, L)>,
    L: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let started = Instant::now();
    let results: Vec<_> = sources
        .into_iter()
        .map(|(source_id, lines)| {
            let records = segment(lines, source_id.as_str(), filter)
                .collect::<Result<Vec<_>, _>>()
                .map_err(SourceError::from);
            (source_id, records)
        })
        .collect();
    assemble(results, started)
}

fn build_pool(worker_threads: usize) -> Option<rayon::ThreadPool> {
    if worker_threads == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads)
        .thread_name(|i| format!("{}-worker-{i}", constants::APP_ID))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            tracing::warn!(
                threads = worker_threads,
                error = %e,
                "Could not build worker pool, using the global pool"
            );
            None
        }
    }
}

/// Read one file and collect its accepted records.
fn process_file(file: &SourceFile, filter: &FilterConfig) -> Result<Vec<LogRecord>, SourceError> {
    let file_start = Instant::now();
    let content = fs::read_source(&file.path, file.is_large).map_err(|e| SourceError::Unreadable {
        path: file.path.clone(),
        source: e,
    })?;

    let records = segment(content.lines(), file.source_id.as_str(), filter)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        file = %file.path.display(),
        bytes = file.size,
        records = records.len(),
        elapsed_ms = file_start.elapsed().as_millis() as u64,
        "Source segmented"
    );
    Ok(records)
}

fn assemble<I>(results: I, started: Instant) -> RunOutcome
where
    I: IntoIterator<Item = (String, Result<Vec<LogRecord>, SourceError>)>,
{
    let mut streams: Vec<Vec<LogRecord>> = Vec::new();
    let mut failures: Vec<SourceFailure> = Vec::new();
    let mut summary = RunSummary::default();

    for (source_id, result) in results {
        summary.sources_attempted += 1;
        match result {
            Ok(records) => {
                summary.sources_succeeded += 1;
                summary.records_accepted += records.len();
                summary.source_summaries.push(SourceSummary {
                    records: records.len(),
                    earliest: records.first().map(|r| r.timestamp),
                    latest: records.last().map(|r| r.timestamp),
                    source_id,
                });
                streams.push(records);
            }
            Err(error) => {
                tracing::warn!(source = %source_id, error = %error, "Source skipped");
                summary.sources_failed += 1;
                failures.push(SourceFailure { source_id, error });
            }
        }
    }

    summary.duration = started.elapsed();
    tracing::info!(
        sources = summary.sources_attempted,
        failed = summary.sources_failed,
        records = summary.records_accepted,
        elapsed_ms = summary.duration.as_millis() as u64,
        "Segmentation complete"
    );

    RunOutcome {
        records: merge(streams),
        failures,
        summary,
    }
}

// =============================================================================
// Tests
// =============================================================================
