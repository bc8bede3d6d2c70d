use super::worker::{self, ArtifactLayout, JobResult, JobRunner};
use futures::stream::{FuturesUnordered, StreamExt};
use globset::{Glob, GlobSetBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Aggregate outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs whose scan reported at least one violation
    pub violations_found: usize,
    /// Highest number of jobs running at once
    pub peak_in_flight: usize,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Run one job per file with at most `concurrency` jobs in flight
///
/// Jobs are admitted in file order; each completion admits the next pending
/// file. A failed job never stops the batch. Counters are owned by this loop
/// and only change when a job completes.
pub async fn run(
    files: Vec<PathBuf>,
    concurrency: usize,
    runner: Arc<dyn JobRunner>,
    artifacts: Arc<ArtifactLayout>,
) -> BatchSummary {
    let concurrency = concurrency.max(1);
    let total = files.len();
    info!("Running {} jobs with max parallelism: {}", total, concurrency);

    let mut pending = files.into_iter().enumerate();
    for (job_id, file) in pending.clone() {
        trace!("[Job {}] Pending: {}", job_id, file.display());
    }

    let mut stream = FuturesUnordered::new();
    let mut summary = BatchSummary {
        total,
        ..Default::default()
    };
    let mut in_flight = 0usize;

    // Fill initial pool up to the concurrency limit
    while in_flight < concurrency {
        let Some((job_id, file)) = pending.next() else {
            break;
        };
        stream.push(worker::worker(job_id, file, runner.clone(), artifacts.clone()));
        in_flight += 1;
    }
    summary.peak_in_flight = in_flight;

    // As jobs complete, admit new ones to keep the pool full
    while let Some(result) = stream.next().await {
        in_flight -= 1;
        record(&mut summary, &result);

        if let Some((job_id, file)) = pending.next() {
            stream.push(worker::worker(job_id, file, runner.clone(), artifacts.clone()));
            in_flight += 1;
            summary.peak_in_flight = summary.peak_in_flight.max(in_flight);
        }
        debug!("{} jobs in flight", in_flight);
    }

    if summary.is_success() {
        info!(
            "Batch complete: {} succeeded, {} failed, {} with violations",
            summary.succeeded, summary.failed, summary.violations_found
        );
    } else {
        warn!(
            "Batch complete: {} succeeded, {} failed, {} with violations",
            summary.succeeded, summary.failed, summary.violations_found
        );
    }
    summary
}

fn record(summary: &mut BatchSummary, result: &JobResult) {
    if result.failed() {
        summary.failed += 1;
        error!("[Job {}] Failed: {}", result.job_id, result.file.display());
    } else {
        summary.succeeded += 1;
        debug!("[Job {}] Succeeded in {:.2}s", result.job_id, result.elapsed_secs);
    }
    if result.violations_found {
        summary.violations_found += 1;
    }
}

/// Drop files matching any of the exclude glob patterns
///
/// Invalid patterns are skipped with a warning.
pub fn filter_excluded(files: Vec<PathBuf>, patterns: &[String]) -> Vec<PathBuf> {
    if patterns.is_empty() {
        return files;
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => builder.add(glob),
            Err(e) => {
                warn!("Invalid exclude pattern '{}': {}", pattern, e);
                continue;
            }
        };
    }

    let globset = match builder.build() {
        Ok(gs) => gs,
        Err(e) => {
            error!("Failed to build exclude globset: {}", e);
            return files;
        }
    };

    files
        .into_iter()
        .filter(|f| {
            let excluded = globset.is_match(f);
            if excluded {
                info!("Skipping excluded file {}", f.display());
            }
            !excluded
        })
        .collect()
}
