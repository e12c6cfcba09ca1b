use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use log::debug;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::aggregator::{AggregatorMessage, HitEvent};
use crate::reference::ReferenceIndex;
use crate::samples::SampleDescriptor;
use crate::seqreader::PairedFastqReader;

/// Read-only state shared by every scan worker of a run.
pub struct ScanContext<'a> {
    pub index: &'a ReferenceIndex,
    /// Stop after this many records per sample; 0 means no limit.
    pub limit: u64,
    /// Raised by the first worker that fails so the others stop early.
    pub abort: &'a AtomicBool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub records: u64,
    pub hits: u64,
    pub aborted: bool,
}

/// Streams one sample's mate files and reports every pair present in the
/// reference index. The index itself is never touched beyond lookups.
pub fn scan_sample(
    sample: &SampleDescriptor,
    ctx: &ScanContext<'_>,
    hits: &Sender<AggregatorMessage>,
) -> Result<ScanStats> {
    let mut reader = PairedFastqReader::open(&sample.mate1, &sample.mate2)
        .with_context(|| format!("Failed to open fastq files for sample {}", sample.id))?;
    let stats = scan_records(&sample.id, &mut reader, ctx, hits).with_context(|| {
        format!(
            "Failed reading from sample {} fastq at record {}",
            sample.id,
            reader.records()
        )
    })?;
    debug!(
        "sample {}: {} records, {} hits",
        sample.id, stats.records, stats.hits
    );
    Ok(stats)
}

pub fn scan_records<R: BufRead>(
    sample_id: &Arc<str>,
    reader: &mut PairedFastqReader<R>,
    ctx: &ScanContext<'_>,
    hits: &Sender<AggregatorMessage>,
) -> Result<ScanStats> {
    let mut stats = ScanStats::default();

    loop {
        if ctx.abort.load(Ordering::Relaxed) {
            stats.aborted = true;
            break;
        }
        let Some(record) = reader.next_pair()? else {
            break;
        };
        stats.records += 1;

        if let Some(entry) = ctx.index.lookup(&record.key) {
            let event = HitEvent {
                entry,
                sample: Arc::clone(sample_id),
            };
            hits.send(AggregatorMessage::Hit(event))
                .map_err(|_| anyhow::anyhow!("hit aggregator stopped accepting hits"))?;
            stats.hits += 1;
        }

        if ctx.limit > 0 && reader.records() >= ctx.limit {
            break;
        }
    }

    Ok(stats)
}
