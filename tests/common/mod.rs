#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use flate2::write::GzEncoder;
use flate2::Compression;
use fqoverlap::{run_to_writer, RunConfig, RunSummary};
use tempfile::TempDir;

pub const K1: (&str, &str) = ("AAAACCCC", "GGGGTTTT");
pub const K2: (&str, &str) = ("ACGTACGT", "TGCATGCA");
pub const K3: (&str, &str) = ("CCCCAAAA", "TTTTGGGG");
pub const OTHER: (&str, &str) = ("GATTACAA", "TTGTAATC");

/// Temporary directory holding FASTQ pairs and a candidate-files list.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_str().unwrap().to_string()
    }

    pub fn path_buf(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes `<sample>_1.fq` and `<sample>_2.fq`, one record per key, read
    /// names `<sample>.<n>`. Returns the two paths.
    pub fn sample(&self, sample: &str, keys: &[(&str, &str)]) -> (String, String) {
        let names: Vec<String> = (0..keys.len()).map(|i| format!("{}.{}", sample, i)).collect();
        let named: Vec<(&str, &str, &str)> = names
            .iter()
            .zip(keys)
            .map(|(name, (s1, s2))| (name.as_str(), *s1, *s2))
            .collect();
        self.named_sample(sample, &named)
    }

    pub fn named_sample(&self, sample: &str, reads: &[(&str, &str, &str)]) -> (String, String) {
        let mate1 = self.path(&format!("{}_1.fq", sample));
        let mate2 = self.path(&format!("{}_2.fq", sample));
        std::fs::write(&mate1, fastq(reads.iter().map(|(n, s, _)| (*n, *s)))).unwrap();
        std::fs::write(&mate2, fastq(reads.iter().map(|(n, _, s)| (*n, *s)))).unwrap();
        (mate1, mate2)
    }

    pub fn gz_sample(&self, sample: &str, keys: &[(&str, &str)]) -> (String, String) {
        let mut paths = Vec::new();
        for mate in 0..2 {
            let path = self.path(&format!("{}_{}.fq.gz", sample, mate + 1));
            let records = keys.iter().enumerate().map(|(i, key)| {
                (
                    format!("{}.{}", sample, i),
                    if mate == 0 { key.0 } else { key.1 },
                )
            });
            let text: String = records
                .map(|(name, seq)| format!("@{}\n{}\n+\n{}\n", name, seq, "E".repeat(seq.len())))
                .collect();
            let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
            encoder.write_all(text.as_bytes()).unwrap();
            encoder.finish().unwrap();
            paths.push(path);
        }
        (paths[0].clone(), paths[1].clone())
    }

    /// Writes the candidate-files list and returns its path.
    pub fn files_list(&self, name: &str, rows: &[(&str, &(String, String))]) -> String {
        let path = self.path(name);
        let text: String = rows
            .iter()
            .map(|(id, (m1, m2))| format!("{}\t{}\t{}\n", id, m1, m2))
            .collect();
        std::fs::write(&path, text).unwrap();
        path
    }
}

fn fastq<'a>(records: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    records
        .map(|(name, seq)| format!("@{}\n{}\n+\n{}\n", name, seq, "E".repeat(seq.len())))
        .collect()
}

pub fn run_capture(config: &RunConfig) -> anyhow::Result<(String, RunSummary)> {
    let mut out = Vec::new();
    let summary = run_to_writer(config, &mut out)?;
    Ok((String::from_utf8(out).unwrap(), summary))
}

/// Data rows as `(seq1, seq2) -> {sample ids}`.
pub fn shared_sets(output: &str) -> BTreeMap<(String, String), BTreeSet<String>> {
    output
        .lines()
        .filter(|line| !line.starts_with("# "))
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 4, "bad row {}", line);
            (
                (fields[1].to_string(), fields[2].to_string()),
                fields[3].split(',').map(str::to_string).collect(),
            )
        })
        .collect()
}

pub fn overlap_headers(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|line| line.starts_with("# overlap\t"))
        .collect()
}

pub fn data_rows(output: &str) -> Vec<&str> {
    output.lines().filter(|line| !line.starts_with("# ")).collect()
}

pub fn key(k: (&str, &str)) -> (String, String) {
    (k.0.to_string(), k.1.to_string())
}

pub fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}
