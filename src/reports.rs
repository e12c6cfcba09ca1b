use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::readcounts::OverlapTable;
use crate::reference::ReferenceIndex;
use crate::samples::SampleDescriptor;

/// Header block of an output file.
#[derive(Debug, Clone)]
pub struct ReportHeader {
    pub reference: SampleDescriptor,
    /// One `# overlap` line each, in this order.
    pub scanned: Vec<SampleDescriptor>,
}

impl ReportHeader {
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "# sample\t{}", self.reference.id)?;
        writeln!(out, "# ref1\t{}", self.reference.mate1)?;
        writeln!(out, "# ref2\t{}", self.reference.mate2)?;
        for sample in &self.scanned {
            writeln!(
                out,
                "# overlap\t{}\t{}\t{}",
                sample.id, sample.mate1, sample.mate2
            )?;
        }
        Ok(())
    }
}

/// Writes one row per reference entry with at least one sample, in entry
/// order, and returns the number of rows.
pub fn write_shared_reads<W: Write>(
    out: &mut W,
    index: &ReferenceIndex,
    table: &OverlapTable,
) -> std::io::Result<usize> {
    let mut shared_reads = 0;
    for (entry, key) in index.keys_by_entry().into_iter().enumerate() {
        let samples = table.sorted_samples(entry);
        if samples.is_empty() {
            continue;
        }
        out.write_all(index.name(entry).as_bytes())?;
        out.write_all(b"\t")?;
        out.write_all(key.mate1())?;
        out.write_all(b"\t")?;
        out.write_all(key.mate2())?;
        out.write_all(b"\t")?;
        out.write_all(samples.join(",").as_bytes())?;
        out.write_all(b"\n")?;
        shared_reads += 1;
    }
    Ok(shared_reads)
}

pub fn write_report<W: Write>(
    out: &mut W,
    header: &ReportHeader,
    index: &ReferenceIndex,
    table: &OverlapTable,
) -> std::io::Result<usize> {
    header.write_to(out)?;
    let shared_reads = write_shared_reads(out, index, table)?;
    out.flush()?;
    Ok(shared_reads)
}

pub fn write_report_file(
    path: &Path,
    header: &ReportHeader,
    index: &ReferenceIndex,
    table: &OverlapTable,
) -> Result<usize> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut ofs = BufWriter::new(file);
    write_report(&mut ofs, header, index, table)
        .with_context(|| format!("Failed writing {}", path.display()))
}
