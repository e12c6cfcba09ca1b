use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Per-sample hit counts for one reference entry.
pub type SampleCounts = FxHashMap<Arc<str>, u64>;

/// The mutable half of the reference index: one `SampleCounts` per entry,
/// addressed by the entry id handed out by `ReferenceIndex`.
///
/// Only the hit aggregator writes to this once scanning has started.
#[derive(Debug, Clone, Default)]
pub struct OverlapTable {
    counts: Vec<SampleCounts>,
}

impl OverlapTable {
    #[cfg(test)]
    pub fn with_entries(n_entries: usize) -> Self {
        OverlapTable {
            counts: vec![SampleCounts::default(); n_entries],
        }
    }

    /// Appends an empty slot for a newly created entry and returns its id.
    pub fn push_entry(&mut self) -> usize {
        self.counts.push(SampleCounts::default());
        self.counts.len() - 1
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn increment(&mut self, entry: usize, sample: &Arc<str>) {
        *self.counts[entry].entry(Arc::clone(sample)).or_insert(0) += 1;
    }

    #[cfg(test)]
    pub fn sample_counts(&self, entry: usize) -> &SampleCounts {
        &self.counts[entry]
    }

    /// Sample ids with at least one hit on `entry`, sorted.
    pub fn sorted_samples(&self, entry: usize) -> Vec<&str> {
        let mut samples: Vec<&str> = self.counts[entry].keys().map(|s| &**s).collect();
        samples.sort_unstable();
        samples
    }

    /// Number of entries shared with at least one sample.
    pub fn shared_reads(&self) -> usize {
        self.counts.iter().filter(|c| !c.is_empty()).count()
    }

    /// Sum of all counts over all entries and samples.
    pub fn sharing_events(&self) -> u64 {
        self.counts.iter().flat_map(|c| c.values()).sum()
    }
}
