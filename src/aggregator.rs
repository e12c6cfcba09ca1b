use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::readcounts::OverlapTable;
use crate::reference::ReferenceIndex;
use crate::reports::{write_report_file, ReportHeader};

/// Capacity of the hit channel; a full channel blocks scan workers.
pub const HIT_CHANNEL_CAPACITY: usize = 4096;

/// A scan worker found `sample` holding the read pair of reference `entry`.
#[derive(Debug, Clone)]
pub struct HitEvent {
    pub entry: usize,
    pub sample: Arc<str>,
}

pub enum AggregatorMessage {
    Hit(HitEvent),
    /// Write the current table to `path`. Everything sent before this message
    /// has been applied by the time it is handled.
    Checkpoint {
        path: PathBuf,
        header: ReportHeader,
    },
}

/// What the aggregator hands back once its channel closes.
#[derive(Debug)]
pub struct AggregatorOutcome {
    pub table: OverlapTable,
    /// Hit events applied during this run, excluding counts loaded from a
    /// continuation file.
    pub hits: u64,
    pub checkpoints_written: usize,
}

/// Sole owner of the mutable overlap counts while scanning is in progress.
pub struct HitAggregator {
    sender: Sender<AggregatorMessage>,
    handle: JoinHandle<AggregatorOutcome>,
}

impl HitAggregator {
    pub fn spawn(index: Arc<ReferenceIndex>, table: OverlapTable) -> Self {
        debug_assert_eq!(index.len(), table.len());
        let (sender, receiver) = crossbeam_channel::bounded(HIT_CHANNEL_CAPACITY);
        let handle = thread::spawn(move || record_samples(&index, table, receiver));
        HitAggregator { sender, handle }
    }

    /// A sender for scan workers; the aggregator keeps running until every
    /// clone and the aggregator's own sender are dropped.
    pub fn sender(&self) -> Sender<AggregatorMessage> {
        self.sender.clone()
    }

    pub fn request_checkpoint(&self, path: PathBuf, header: ReportHeader) {
        // The receiver only goes away if the aggregator thread died; `finish`
        // reports that.
        let _ = self
            .sender
            .send(AggregatorMessage::Checkpoint { path, header });
    }

    /// Closes the channel, waits for the queue to drain and returns the table.
    pub fn finish(self) -> anyhow::Result<AggregatorOutcome> {
        drop(self.sender);
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("hit aggregator thread panicked"))
    }
}

fn record_samples(
    index: &ReferenceIndex,
    mut table: OverlapTable,
    receiver: Receiver<AggregatorMessage>,
) -> AggregatorOutcome {
    let mut hits = 0u64;
    let mut checkpoints_written = 0;

    for message in receiver {
        match message {
            AggregatorMessage::Hit(hit) => {
                table.increment(hit.entry, &hit.sample);
                hits += 1;
            }
            AggregatorMessage::Checkpoint { path, header } => {
                match write_report_file(&path, &header, index, &table) {
                    Ok(shared) => {
                        info!(
                            "wrote intermediate progress ({} shared reads) to {}",
                            shared,
                            path.display()
                        );
                        checkpoints_written += 1;
                    }
                    Err(e) => warn!("can't write to {}, skipping: {:#}", path.display(), e),
                }
            }
        }
    }

    AggregatorOutcome {
        table,
        hits,
        checkpoints_written,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_key::ReadKey;
    use crate::reference::ReferenceBuilder;
    use crate::samples::SampleDescriptor;
    use crate::seqreader::PairedFastqReader;

    fn index_with_two_keys() -> (Arc<ReferenceIndex>, OverlapTable) {
        let mut builder = ReferenceBuilder::new();
        let mate1 = "@r1\nAAAA\n+\nEEEE\n@r2\nCCCC\n+\nEEEE\n";
        let mate2 = "@r1\nGGGG\n+\nEEEE\n@r2\nTTTT\n+\nEEEE\n";
        let mut reader = PairedFastqReader::new(mate1.as_bytes(), mate2.as_bytes(), "1", "2");
        builder.load_reference(&mut reader, 0).unwrap();
        let (index, table) = builder.finish();
        (Arc::new(index), table)
    }

    fn hit(entry: usize, sample: &str) -> AggregatorMessage {
        AggregatorMessage::Hit(HitEvent {
            entry,
            sample: Arc::from(sample),
        })
    }

    #[test]
    fn test_hits_from_many_threads() {
        let (index, table) = index_with_two_keys();
        let aggregator = HitAggregator::spawn(Arc::clone(&index), table);

        let producers: Vec<_> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|sample| {
                let sender = aggregator.sender();
                thread::spawn(move || {
                    for i in 0..100 {
                        sender.send(hit(i % 2, sample)).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let outcome = aggregator.finish().unwrap();
        assert_eq!(outcome.hits, 400);
        assert_eq!(outcome.table.sharing_events(), 400);
        assert_eq!(outcome.table.sample_counts(0).get("C"), Some(&50));
        assert_eq!(outcome.table.sorted_samples(1), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_checkpoint_sees_earlier_hits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.tsv");
        let (index, table) = index_with_two_keys();
        let aggregator = HitAggregator::spawn(Arc::clone(&index), table);

        let sender = aggregator.sender();
        sender.send(hit(1, "A")).unwrap();
        drop(sender);
        let header = ReportHeader {
            reference: SampleDescriptor::new("REF", "1", "2"),
            scanned: vec![SampleDescriptor::new("A", "a1", "a2")],
        };
        aggregator.request_checkpoint(path.clone(), header);
        let outcome = aggregator.finish().unwrap();
        assert_eq!(outcome.checkpoints_written, 1);

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "# sample\tREF\n# ref1\t1\n# ref2\t2\n# overlap\tA\ta1\ta2\nr2\tCCCC\tTTTT\tA\n"
        );
        assert!(index.contains(&ReadKey::new(b"CCCC".to_vec(), b"TTTT".to_vec())));
    }

    #[test]
    fn test_unwritable_checkpoint_is_skipped() {
        let (index, table) = index_with_two_keys();
        let aggregator = HitAggregator::spawn(index, table);
        let header = ReportHeader {
            reference: SampleDescriptor::new("REF", "1", "2"),
            scanned: Vec::new(),
        };
        aggregator.request_checkpoint(PathBuf::from("/nonexistent/dir/progress.tsv"), header);
        let outcome = aggregator.finish().unwrap();
        assert_eq!(outcome.checkpoints_written, 0);
        assert_eq!(outcome.hits, 0);
    }
}
