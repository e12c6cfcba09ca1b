// Paired-read overlap detection between a reference sample and many others.
pub mod aggregator;
pub mod batch;
pub mod continuation;
pub mod errors;
pub mod gz_stream;
pub mod options;
pub mod pipeline;
pub mod read_key;
pub mod readcounts;
pub mod reference;
pub mod reports;
pub mod samples;
pub mod scan;
pub mod seqreader;

pub use pipeline::{run, run_to_writer, RunConfig, RunSummary};
