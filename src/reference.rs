use anyhow::Result;
use log::{info, warn};
use rustc_hash::FxHashMap;
use std::io::BufRead;
use std::sync::Arc;

use crate::errors::OverlapError;
use crate::read_key::ReadKey;
use crate::readcounts::OverlapTable;
use crate::seqreader::PairedFastqReader;

const PROGRESS_INTERVAL: u64 = 1_000_000;
const MAX_LOGGED_SKIPS: u64 = 10;

/// Only the first `MAX_LOGGED_SKIPS` name mismatches are logged one by one;
/// `skipped` counts the mismatches seen before this one.
fn skip_is_logged(skipped: u64) -> bool {
    skipped < MAX_LOGGED_SKIPS
}

/// The frozen key set of the reference sample.
///
/// Each key maps to a dense entry id; the id indexes both the read name stored
/// here and the sample counts held in an `OverlapTable`. Nothing can be added
/// once the index is built, so it is shared read-only between scan workers.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    keys: FxHashMap<ReadKey, usize>,
    names: Vec<String>,
}

impl ReferenceIndex {
    pub fn lookup(&self, key: &ReadKey) -> Option<usize> {
        self.keys.get(key).copied()
    }

    pub fn contains(&self, key: &ReadKey) -> bool {
        self.keys.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, entry: usize) -> &str {
        &self.names[entry]
    }

    /// Keys laid out by entry id, i.e. in insertion order.
    pub fn keys_by_entry(&self) -> Vec<&ReadKey> {
        let mut slots: Vec<Option<&ReadKey>> = vec![None; self.names.len()];
        for (key, &entry) in &self.keys {
            slots[entry] = Some(key);
        }
        slots.into_iter().flatten().collect()
    }
}

/// Counters from re-reading the reference sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceLoadStats {
    /// Keys already present from the continuation file with the same name.
    pub found: u64,
    pub added: u64,
    /// Keys already present under a different read name; left untouched.
    pub skipped: u64,
    pub records: u64,
    pub reached_limit: bool,
}

/// Builds a `ReferenceIndex` and its initial `OverlapTable`, first from a
/// continuation file (if any) and then from the reference sample itself.
#[derive(Debug, Default)]
pub struct ReferenceBuilder {
    index: ReferenceIndex,
    table: OverlapTable,
}

impl ReferenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Adds an entry recovered from a previous run. Each listed sample counts
    /// once per appearance; a key seen twice means the file is corrupt.
    pub fn insert_continued(
        &mut self,
        name: &str,
        key: ReadKey,
        samples: &[Arc<str>],
    ) -> Result<(), OverlapError> {
        if self.index.contains(&key) {
            return Err(OverlapError::continuation(format!(
                "already saw key {:?} in continue file",
                key
            )));
        }
        let entry = self.insert(name, key);
        for sample in samples {
            self.table.increment(entry, sample);
        }
        Ok(())
    }

    /// Reads the reference sample, adding every key not yet present.
    ///
    /// A key that already exists under another read name is skipped and
    /// counted; the stored name is never overwritten.
    pub fn load_reference<R: BufRead>(
        &mut self,
        reader: &mut PairedFastqReader<R>,
        limit: u64,
    ) -> Result<ReferenceLoadStats> {
        let mut stats = ReferenceLoadStats::default();

        while let Some(record) = reader.next_pair()? {
            stats.records += 1;
            if stats.records % PROGRESS_INTERVAL == 0 {
                info!(
                    "{} reference records: {} found, {} added",
                    stats.records, stats.found, stats.added
                );
            }

            match self.index.lookup(&record.key) {
                Some(entry) if self.index.name(entry) != record.name => {
                    if skip_is_logged(stats.skipped) {
                        info!(
                            "existing entry for {:?} has name {}, which is different from {}",
                            record.key,
                            self.index.name(entry),
                            record.name
                        );
                    }
                    stats.skipped += 1;
                }
                Some(_) => stats.found += 1,
                None => {
                    self.insert(&record.name, record.key);
                    stats.added += 1;
                }
            }

            if limit > 0 && reader.records() >= limit {
                warn!("reached refseq limit");
                stats.reached_limit = true;
                break;
            }
        }

        Ok(stats)
    }

    pub fn finish(self) -> (ReferenceIndex, OverlapTable) {
        (self.index, self.table)
    }

    fn insert(&mut self, name: &str, key: ReadKey) -> usize {
        let entry = self.table.push_entry();
        self.index.keys.insert(key, entry);
        self.index.names.push(name.to_string());
        entry
    }
}
