use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use crate::pipeline::RunConfig;

/// Find reads of a reference sample that occur, with identical mate
/// sequences, in other samples.
///
/// The file given with --files has three tab-separated columns: sample id,
/// mate 1 fastq, mate 2 fastq. The reference sample must be one of its rows.
#[derive(Parser, Debug, Clone, Serialize)]
#[clap(author, version, about, long_about = None)]
pub struct Options {
    /// Sample id of the reference sample (required)
    #[clap(short, long, value_parser)]
    pub sample: String,

    /// File that contains the list of fastq files (required)
    #[clap(short, long, value_parser)]
    pub files: String,

    /// Only consider the first LIMIT fastq records in each sample (0 = all)
    #[clap(short, long, default_value_t = 0, value_parser)]
    pub limit: u64,

    /// Process files in batches to avoid open file limits
    #[clap(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub batches: u32,

    /// Write data after each batch to this file
    #[clap(long, value_parser)]
    pub progress: Option<PathBuf>,

    /// File with output from an existing run we'll add to
    #[clap(short = 'c', long = "continue", value_parser)]
    pub continue_from: Option<String>,

    /// Output file (default: standard output)
    #[clap(short, long, value_parser)]
    pub output: Option<PathBuf>,

    /// Number of samples scanned at the same time within a batch
    #[clap(short = 't', long, default_value_t = num_cpus::get(), value_parser)]
    pub threads: usize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value_t = 1, value_parser)]
    pub verbose: u8,
}

impl Options {
    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            sample: self.sample.clone(),
            files: self.files.clone(),
            limit: self.limit,
            batches: self.batches as usize,
            progress: self.progress.clone(),
            continue_from: self.continue_from.clone(),
            output: self.output.clone(),
            threads: self.threads,
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}
