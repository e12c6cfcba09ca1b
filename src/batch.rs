use anyhow::Result;
use log::{debug, info, warn};
use rayon::ThreadPool;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::aggregator::HitAggregator;
use crate::reference::ReferenceIndex;
use crate::reports::ReportHeader;
use crate::samples::SampleDescriptor;
use crate::scan::{scan_sample, ScanContext, ScanStats};

/// Sample at list position `i` belongs to batch `i % n_batches`.
pub fn batch_of(position: usize, n_batches: usize) -> usize {
    position % n_batches
}

/// Splits `samples` into `n_batches` round-robin groups, keeping list order
/// inside each group. Trailing groups may be empty.
pub fn partition_batches(
    samples: &[SampleDescriptor],
    n_batches: usize,
) -> Vec<Vec<&SampleDescriptor>> {
    let mut batches: Vec<Vec<&SampleDescriptor>> = vec![Vec::new(); n_batches];
    for (position, sample) in samples.iter().enumerate() {
        batches[batch_of(position, n_batches)].push(sample);
    }
    batches
}

pub struct BatchSettings {
    pub batches: usize,
    pub limit: u64,
    pub progress: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub samples: usize,
    pub records: u64,
    pub hits: u64,
    pub checkpoints_requested: usize,
}

/// Runs every batch in turn: one scan task per sample on `pool`, then a
/// barrier, then an optional checkpoint request before the next batch.
///
/// The first failing sample ends the run; the remaining workers of its batch
/// see the abort flag and stop, and later batches never start.
pub fn run_batches(
    pool: &ThreadPool,
    candidates: &[SampleDescriptor],
    settings: &BatchSettings,
    index: &ReferenceIndex,
    aggregator: &HitAggregator,
    header: &ReportHeader,
) -> Result<BatchSummary> {
    let abort = AtomicBool::new(false);
    let ctx = ScanContext {
        index,
        limit: settings.limit,
        abort: &abort,
    };
    let mut summary = BatchSummary::default();
    let batches = partition_batches(candidates, settings.batches);

    for (b, batch) in batches.iter().enumerate() {
        info!("Processing {} samples in batch {}", batch.len(), b);
        let mut results: Vec<Option<Result<ScanStats>>> = batch.iter().map(|_| None).collect();

        pool.scope(|s| {
            for (slot, &sample) in results.iter_mut().zip(batch) {
                let sender = aggregator.sender();
                let ctx = &ctx;
                s.spawn(move |_| {
                    let result = scan_sample(sample, ctx, &sender);
                    if result.is_err() {
                        ctx.abort.store(true, Ordering::Relaxed);
                    }
                    *slot = Some(result);
                });
            }
        });

        let mut first_error = None;
        let mut aborted = 0;
        for result in results {
            match result {
                Some(Ok(stats)) => {
                    if stats.aborted {
                        aborted += 1;
                    }
                    summary.records += stats.records;
                    summary.hits += stats.hits;
                }
                Some(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                None => anyhow::bail!("scan task of batch {} did not report a result", b),
            }
        }
        if let Some(e) = first_error {
            if aborted > 0 {
                warn!(
                    "stopped {} other scans of batch {} after a failed sample",
                    aborted, b
                );
            }
            return Err(e);
        }
        summary.samples += batch.len();
        debug!(
            "batch {} done, {} samples scanned so far",
            b, summary.samples
        );

        if let Some(progress) = &settings.progress {
            if b + 1 != settings.batches {
                let completed = checkpoint_header(header, candidates, b, settings.batches);
                aggregator.request_checkpoint(progress.clone(), completed);
                summary.checkpoints_requested += 1;
            }
        }
    }

    Ok(summary)
}

/// `header` extended with the candidates of batches `0..=last_batch`.
fn checkpoint_header(
    header: &ReportHeader,
    candidates: &[SampleDescriptor],
    last_batch: usize,
    n_batches: usize,
) -> ReportHeader {
    let mut completed = header.clone();
    completed.scanned.extend(
        candidates
            .iter()
            .enumerate()
            .filter(|(position, _)| batch_of(*position, n_batches) <= last_batch)
            .map(|(_, sample)| sample.clone()),
    );
    completed
}
