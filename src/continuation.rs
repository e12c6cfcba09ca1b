//! Loading a previous run's output so a new run can extend it.
//!
//! The file is the same text format `reports` writes: `# sample`, `# ref1`,
//! `# ref2` and `# overlap` headers followed by one row per shared read.

use anyhow::{Context, Result};
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};
use std::io::BufRead;
use std::sync::Arc;

use crate::errors::OverlapError;
use crate::gz_stream::open_input;
use crate::read_key::ReadKey;
use crate::reference::ReferenceBuilder;
use crate::samples::SampleDescriptor;

/// What a continuation file contributed besides its index entries.
#[derive(Debug, Clone, Default)]
pub struct Continuation {
    /// Samples already scanned against this reference, in file order.
    pub scanned: Vec<SampleDescriptor>,
    pub rows: usize,
}

impl Continuation {
    /// The descriptor a prior run recorded for `sample_id`, if it was scanned.
    pub fn scanned_sample(&self, sample_id: &str) -> Option<&SampleDescriptor> {
        self.scanned.iter().find(|s| &*s.id == sample_id)
    }
}

pub fn load_continuation_file(
    path: &str,
    reference: &SampleDescriptor,
    builder: &mut ReferenceBuilder,
) -> Result<Continuation> {
    info!("Continuing from {}", path);
    let reader =
        open_input(path).with_context(|| format!("Failed to open continue file {}", path))?;
    load_continuation(reader, path, reference, builder)
}

/// Validates the headers against `reference` and seeds `builder` with every
/// data row. Any structural problem is fatal; nothing is skipped.
pub fn load_continuation<R: BufRead>(
    reader: R,
    path: &str,
    reference: &SampleDescriptor,
    builder: &mut ReferenceBuilder,
) -> Result<Continuation> {
    let mut continuation = Continuation::default();
    let mut found_sample = false;
    let mut found_ref1 = false;
    let mut found_ref2 = false;
    let mut scanned_ids: FxHashSet<Arc<str>> = FxHashSet::default();
    let mut interned: FxHashMap<String, Arc<str>> = FxHashMap::default();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed reading continue file {}", path))?;
        let line_num = line_num + 1;

        if let Some(header) = line.strip_prefix("# ") {
            let (tag, value) = header.split_once('\t').unwrap_or((header, ""));
            match tag {
                "sample" => {
                    if value != &*reference.id {
                        return Err(OverlapError::continuation(format!(
                            "continue file is for sample {} instead of sample {}",
                            value, reference.id
                        ))
                        .into());
                    }
                    found_sample = true;
                }
                "ref1" => {
                    check_reference_path(path, "ref1", value, &reference.mate1)?;
                    found_ref1 = true;
                }
                "ref2" => {
                    check_reference_path(path, "ref2", value, &reference.mate2)?;
                    found_ref2 = true;
                }
                "overlap" => {
                    let sample = SampleDescriptor::parse_fields(value).ok_or_else(|| {
                        OverlapError::continuation(format!(
                            "malformed '# overlap' line ({}): {}",
                            line_num, line
                        ))
                    })?;
                    if sample.id == reference.id {
                        return Err(OverlapError::continuation(format!(
                            "'# overlap' line ({}) names the reference sample {}",
                            line_num, sample.id
                        ))
                        .into());
                    }
                    if !scanned_ids.insert(Arc::clone(&sample.id)) {
                        return Err(OverlapError::continuation(format!(
                            "sample {} has more than one '# overlap' line in {}",
                            sample.id, path
                        ))
                        .into());
                    }
                    continuation.scanned.push(sample);
                }
                _ => {
                    return Err(OverlapError::continuation(format!(
                        "Unrecognized comment line ({}) in continue file: {}",
                        line_num, line
                    ))
                    .into())
                }
            }
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let [name, seq1, seq2, sample_list] = fields.as_slice() else {
            return Err(OverlapError::continuation(format!(
                "malformed line {} in {}: {}",
                line_num, path, line
            ))
            .into());
        };
        if sample_list.is_empty() {
            return Err(OverlapError::continuation(format!(
                "line {} in {} has an empty sample list",
                line_num, path
            ))
            .into());
        }

        let samples: Vec<Arc<str>> = sample_list
            .split(',')
            .map(|id| {
                interned
                    .entry(id.to_string())
                    .or_insert_with(|| Arc::from(id))
                    .clone()
            })
            .collect();
        let key = ReadKey::new(seq1.as_bytes().to_vec(), seq2.as_bytes().to_vec());
        builder
            .insert_continued(name, key, &samples)
            .with_context(|| format!("line {} of {}", line_num, path))?;
        continuation.rows += 1;
    }

    for (found, tag) in [
        (found_ref1, "ref1"),
        (found_ref2, "ref2"),
        (found_sample, "sample"),
    ] {
        if !found {
            return Err(OverlapError::continuation(format!(
                "Expecting continue file {} to have '# {}' line",
                path, tag
            ))
            .into());
        }
    }

    info!(
        "Loaded {} shared reads and {} scanned samples from {}",
        continuation.rows,
        continuation.scanned.len(),
        path
    );
    Ok(continuation)
}

fn check_reference_path(path: &str, tag: &str, found: &str, expected: &str) -> Result<()> {
    if found != expected {
        return Err(OverlapError::continuation(format!(
            "{} in continue file {} is {}, expecting {}",
            tag, path, found, expected
        ))
        .into());
    }
    Ok(())
}
