use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::aggregator::HitAggregator;
use crate::batch::{run_batches, BatchSettings};
use crate::continuation::{load_continuation_file, Continuation};
use crate::errors::{ErrorKind, OverlapError};
use crate::reference::{ReferenceBuilder, ReferenceLoadStats};
use crate::reports::{write_report, ReportHeader};
use crate::samples::{SampleDescriptor, SampleList};
use crate::seqreader::PairedFastqReader;

/// Everything one run needs, independent of how it was parsed.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub sample: String,
    pub files: String,
    /// Records per sample to consider, reference included; 0 means all.
    pub limit: u64,
    pub batches: usize,
    pub progress: Option<PathBuf>,
    pub continue_from: Option<String>,
    /// `None` writes to standard output.
    pub output: Option<PathBuf>,
    /// Scan pool size; 0 lets rayon decide.
    pub threads: usize,
}

impl RunConfig {
    pub fn new(sample: &str, files: &str) -> Self {
        RunConfig {
            sample: sample.to_string(),
            files: files.to_string(),
            limit: 0,
            batches: 1,
            progress: None,
            continue_from: None,
            output: None,
            threads: 0,
        }
    }

    fn validate(&self) -> Result<(), OverlapError> {
        if self.sample.is_empty() || self.files.is_empty() {
            return Err(OverlapError::config(
                "arguments -files, and -sample are required",
            ));
        }
        if self.batches == 0 {
            return Err(OverlapError::config("batch count must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub candidates_listed: usize,
    pub candidates_scanned: usize,
    pub continued_rows: usize,
    pub reference: ReferenceLoadStats,
    pub shared_reads: usize,
    /// Hit events produced by this run's scans.
    pub hits: u64,
    pub checkpoints_written: usize,
}

/// Runs the whole detection and writes the result to `config.output` or
/// standard output.
///
/// An output file is only replaced once the run has succeeded, so a failed
/// run leaves it as it was. This also lets a run continue from its own output.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    match &config.output {
        Some(path) => {
            let partial = partial_output_path(path);
            let file = File::create(&partial).map_err(|e| {
                OverlapError::new(
                    ErrorKind::Io,
                    format!("Failed to create output {}: {}", partial.display(), e),
                )
            })?;
            let summary = match run_to_writer(config, &mut BufWriter::new(file)) {
                Ok(summary) => summary,
                Err(e) => {
                    let _ = fs::remove_file(&partial);
                    return Err(e);
                }
            };
            fs::rename(&partial, path).map_err(|e| {
                OverlapError::new(
                    ErrorKind::Io,
                    format!(
                        "Failed to move {} to {}: {}",
                        partial.display(),
                        path.display(),
                        e
                    ),
                )
            })?;
            Ok(summary)
        }
        None => {
            let stdout = io::stdout();
            run_to_writer(config, &mut BufWriter::new(stdout.lock()))
        }
    }
}

/// `<output>.partial`, next to the output so the final rename stays on one
/// filesystem.
fn partial_output_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

pub fn run_to_writer<W: Write>(config: &RunConfig, out: &mut W) -> Result<RunSummary> {
    config.validate()?;

    let list = SampleList::from_path(&config.files, &config.sample)?;
    info!("found self in file list and read files match ref1 and ref2");
    let reference = list.reference;
    let candidates_listed = list.candidates.len();

    let mut builder = ReferenceBuilder::new();
    let continuation = match &config.continue_from {
        Some(path) => load_continuation_file(path, &reference, &mut builder)?,
        None => Continuation::default(),
    };
    if config.continue_from.is_some() {
        info!(
            "{} reference reads and {} scanned samples cached from continue file",
            builder.len(),
            continuation.scanned.len()
        );
    }
    let candidates = pending_candidates(list.candidates, &continuation);

    info!("Processing ref sequence");
    let reference_stats = load_reference(&reference, &mut builder, config.limit)?;
    info!(
        "Done processing ref sequence, {} cached from continue, added {} and skipped {}",
        reference_stats.found, reference_stats.added, reference_stats.skipped
    );

    let (index, table) = builder.finish();
    let index = Arc::new(index);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .context("Failed to build scan thread pool")?;

    let mut header = ReportHeader {
        reference: reference.clone(),
        scanned: continuation.scanned.clone(),
    };
    let settings = BatchSettings {
        batches: config.batches,
        limit: config.limit,
        progress: config.progress.clone(),
    };

    info!(
        "Will read {} files of {} listed in {} in {} batches",
        candidates.len(),
        candidates_listed,
        config.files,
        config.batches
    );
    let aggregator = HitAggregator::spawn(Arc::clone(&index), table);
    let scanned = run_batches(&pool, &candidates, &settings, &index, &aggregator, &header);
    let outcome = aggregator.finish()?;
    let batch_summary = scanned?;

    info!("Writing output");
    header.scanned.extend(candidates.iter().cloned());
    let shared_reads = write_report(out, &header, &index, &outcome.table).map_err(|e| {
        OverlapError::new(ErrorKind::Io, format!("Failed writing output: {}", e))
    })?;

    info!(
        "Got {} shared reads with {} sharing events in aggregate",
        shared_reads,
        outcome.table.sharing_events()
    );

    Ok(RunSummary {
        candidates_listed,
        candidates_scanned: batch_summary.samples,
        continued_rows: continuation.rows,
        reference: reference_stats,
        shared_reads,
        hits: outcome.hits,
        checkpoints_written: outcome.checkpoints_written,
    })
}

/// Drops candidates already scanned in the continued run, keeping list order.
fn pending_candidates(
    candidates: Vec<SampleDescriptor>,
    continuation: &Continuation,
) -> Vec<SampleDescriptor> {
    candidates
        .into_iter()
        .filter(|candidate| {
            let Some(prior) = continuation.scanned_sample(&candidate.id) else {
                return true;
            };
            if prior.mate1 != candidate.mate1 || prior.mate2 != candidate.mate2 {
                warn!(
                    "sample {} was scanned from {} and {} in the continued run; not rescanning {} and {}",
                    candidate.id, prior.mate1, prior.mate2, candidate.mate1, candidate.mate2
                );
            }
            false
        })
        .collect()
}

fn load_reference(
    reference: &SampleDescriptor,
    builder: &mut ReferenceBuilder,
    limit: u64,
) -> Result<ReferenceLoadStats> {
    let mut reader = PairedFastqReader::open(&reference.mate1, &reference.mate2)
        .context("Failed to open reference fastq files")?;
    info!("Opened ref1 {}", reference.mate1);
    info!("Opened ref2 {}", reference.mate2);
    builder
        .load_reference(&mut reader, limit)
        .context("Failed reading reference fastq")
}
