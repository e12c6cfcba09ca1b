use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 128 * 1024;

/// Opens `path` for buffered reading.
///
/// An empty path reads standard input. Paths ending in `.gz` are decompressed
/// on the fly; concatenated gzip members are read as one stream.
pub fn open_input(path: &str) -> Result<Box<dyn BufRead + Send>> {
    if path.is_empty() {
        return Ok(Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            io::stdin(),
        )));
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    if is_gzipped(path) {
        let decoder = MultiGzDecoder::new(file);
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }
}

fn is_gzipped(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map_or(false, |ext| ext == "gz")
}
