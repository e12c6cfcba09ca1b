use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::io::BufRead;
use std::sync::Arc;

use crate::errors::OverlapError;
use crate::gz_stream::open_input;

/// A sample id with its two mate files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleDescriptor {
    pub id: Arc<str>,
    pub mate1: String,
    pub mate2: String,
}

impl SampleDescriptor {
    pub fn new(id: &str, mate1: &str, mate2: &str) -> Self {
        SampleDescriptor {
            id: Arc::from(id),
            mate1: mate1.to_string(),
            mate2: mate2.to_string(),
        }
    }

    /// Parses a `sampleId<TAB>mate1<TAB>mate2` line.
    pub fn parse_fields(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [id, mate1, mate2] => Some(Self::new(id, mate1, mate2)),
            _ => None,
        }
    }
}

/// The candidate-files list split into the reference sample and the rest.
#[derive(Debug, Clone)]
pub struct SampleList {
    pub reference: SampleDescriptor,
    /// Candidates in list order, reference excluded.
    pub candidates: Vec<SampleDescriptor>,
}

impl SampleList {
    pub fn from_path(path: &str, reference_id: &str) -> Result<Self> {
        let reader = open_input(path)
            .with_context(|| format!("Failed to open list of fastq files {}", path))?;
        Self::from_reader(reader, path, reference_id)
    }

    /// Every line must have exactly three fields and every sample id must be
    /// unique, the reference sample's included.
    pub fn from_reader<R: BufRead>(reader: R, path: &str, reference_id: &str) -> Result<Self> {
        let mut reference = None;
        let mut candidates = Vec::new();
        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed reading {}", path))?;
            let sample = SampleDescriptor::parse_fields(&line).ok_or_else(|| {
                OverlapError::config(format!(
                    "malformed line {} in {}: {}",
                    line_num + 1,
                    path,
                    line
                ))
            })?;
            if !seen.insert(Arc::clone(&sample.id)) {
                return Err(OverlapError::config(format!(
                    "already saw sample {} in files list",
                    sample.id
                ))
                .into());
            }
            if &*sample.id == reference_id {
                reference = Some(sample);
            } else {
                candidates.push(sample);
            }
        }

        let reference = reference.ok_or_else(|| {
            OverlapError::config(format!(
                "failed to find self, {}, in list of fastq files",
                reference_id
            ))
        })?;

        Ok(SampleList {
            reference,
            candidates,
        })
    }
}
