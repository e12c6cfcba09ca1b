use anyhow::{Error, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufWriter, Write};

const BASES: [u8; 4] = [b'A', b'T', b'G', b'C'];
const NAME_LEN: usize = 12;

/// Generate random FASTQ reads for exercising fqoverlap.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Options {
    /// Number of reads
    #[clap(short, long, value_parser)]
    reads: u64,

    /// Read length
    #[clap(short, long, default_value_t = 75, value_parser)]
    len: usize,

    /// Seed for reproducible output
    #[clap(short, long, value_parser)]
    seed: Option<u64>,
}

fn random_read_name<R: Rng>(rng: &mut R) -> String {
    (0..NAME_LEN)
        .map(|_| (b'a' + rng.random_range(0..26u8)) as char)
        .collect()
}

fn write_reads<R: Rng, W: Write>(rng: &mut R, out: &mut W, reads: u64, len: usize) -> Result<()> {
    let qual = vec![b'E'; len];
    let mut seq = vec![0u8; len];

    for _ in 0..reads {
        for base in seq.iter_mut() {
            *base = BASES[rng.random_range(0..BASES.len())];
        }
        writeln!(out, "@{}", random_read_name(rng))?;
        out.write_all(&seq)?;
        out.write_all(b"\n+\n")?;
        out.write_all(&qual)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<(), Error> {
    let opts = Options::parse();
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_reads(&mut rng, &mut out, opts.reads, opts.len)
}
