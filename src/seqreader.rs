use anyhow::Result;
use std::io::{self, BufRead};

use crate::errors::OverlapError;
use crate::gz_stream::open_input;
use crate::read_key::ReadKey;

/// One aligned mate pair. `name` is the mate 1 header without the leading `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedRecord {
    pub name: String,
    pub key: ReadKey,
}

/// Reads two FASTQ files in lock step, four lines at a time from each.
///
/// Any structural problem (a file ending inside a record, one mate file
/// running out before the other, a header without `@` or a separator without
/// `+`) is reported as a `RecordFormat` error naming the file and line.
pub struct PairedFastqReader<R: BufRead> {
    reader1: R,
    reader2: R,
    path1: String,
    path2: String,
    line1: Vec<u8>,
    line2: Vec<u8>,
    line_num: usize,
    records: u64,
}

impl PairedFastqReader<Box<dyn BufRead + Send>> {
    /// Opens both mate files; an empty path reads standard input.
    pub fn open(path1: &str, path2: &str) -> Result<Self> {
        let reader1 = open_input(path1)?;
        let reader2 = open_input(path2)?;
        Ok(Self::new(reader1, reader2, path1, path2))
    }
}

impl<R: BufRead> PairedFastqReader<R> {
    pub fn new(reader1: R, reader2: R, path1: &str, path2: &str) -> Self {
        Self {
            reader1,
            reader2,
            path1: display_path(path1),
            path2: display_path(path2),
            line1: Vec::with_capacity(256),
            line2: Vec::with_capacity(256),
            line_num: 0,
            records: 0,
        }
    }

    /// Number of complete pairs returned so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Returns the next pair, or `None` once both files are exhausted at a
    /// record boundary.
    pub fn next_pair(&mut self) -> Result<Option<PairedRecord>> {
        let mut name = String::new();
        let mut seq1 = Vec::new();
        let mut seq2 = Vec::new();

        for i in 0..4 {
            let got1 = read_line(&mut self.reader1, &mut self.line1)?;
            let got2 = read_line(&mut self.reader2, &mut self.line2)?;
            match (got1, got2) {
                (false, false) if i == 0 => return Ok(None),
                (false, _) => return Err(self.truncated(&self.path1).into()),
                (true, false) => return Err(self.truncated(&self.path2).into()),
                (true, true) => {}
            }

            match i {
                0 => {
                    self.expect_prefix(b'@')?;
                    name = String::from_utf8_lossy(&self.line1[1..]).into_owned();
                }
                1 => {
                    seq1.extend_from_slice(&self.line1);
                    seq2.extend_from_slice(&self.line2);
                }
                2 => self.expect_prefix(b'+')?,
                _ => {}
            }
            self.line_num += 1;
        }

        self.records += 1;
        Ok(Some(PairedRecord {
            name,
            key: ReadKey::new(seq1, seq2),
        }))
    }

    fn expect_prefix(&self, prefix: u8) -> Result<(), OverlapError> {
        for (line, path) in [(&self.line1, &self.path1), (&self.line2, &self.path2)] {
            if line.first() != Some(&prefix) {
                return Err(OverlapError::record_format(format!(
                    "expecting {} line {} to start with '{}'",
                    path,
                    self.line_num + 1,
                    prefix as char
                )));
            }
        }
        Ok(())
    }

    fn truncated(&self, path: &str) -> OverlapError {
        OverlapError::record_format(format!(
            "file {} truncated at line {}",
            path,
            self.line_num + 1
        ))
    }
}

/// Reads one line into `buf` without its `\n` or `\r\n` terminator.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<stdin>".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{error_kind, ErrorKind};

    fn reader<'a>(mate1: &'a str, mate2: &'a str) -> PairedFastqReader<&'a [u8]> {
        PairedFastqReader::new(mate1.as_bytes(), mate2.as_bytes(), "r1.fq", "r2.fq")
    }

    #[test]
    fn test_paired_parsing() {
        let mut reader = reader(
            "@read1 1:N\nACGT\n+\nEEEE\n@read2\nGGCC\n+\nEEEE\n",
            "@read1 2:N\nTTAA\n+\nEEEE\n@read2\nCCAA\n+\nEEEE\n",
        );

        let first = reader.next_pair().unwrap().unwrap();
        assert_eq!(first.name, "read1 1:N");
        assert_eq!(first.key, ReadKey::new(b"ACGT".to_vec(), b"TTAA".to_vec()));

        let second = reader.next_pair().unwrap().unwrap();
        assert_eq!(second.name, "read2");
        assert_eq!(second.key.mate1(), b"GGCC");
        assert_eq!(second.key.mate2(), b"CCAA");

        assert!(reader.next_pair().unwrap().is_none());
        assert_eq!(reader.records(), 2);
    }

    #[test]
    fn test_crlf_and_missing_final_newline() {
        let mut reader = reader("@r\r\nAC\r\n+\r\nEE", "@r\nGT\n+\nEE");
        let record = reader.next_pair().unwrap().unwrap();
        assert_eq!(record.name, "r");
        assert_eq!(record.key, ReadKey::new(b"AC".to_vec(), b"GT".to_vec()));
        assert!(reader.next_pair().unwrap().is_none());
    }

    #[test]
    fn test_empty_inputs() {
        let mut reader = reader("", "");
        assert!(reader.next_pair().unwrap().is_none());
        assert_eq!(reader.records(), 0);
    }

    #[test]
    fn test_truncated_mate2() {
        let mut reader = reader("@r\nAC\n+\nEE\n", "@r\nGT\n");
        let err = reader.next_pair().unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::RecordFormat));
        assert!(err.to_string().contains("file r2.fq truncated at line 3"));
    }

    #[test]
    fn test_mate1_shorter_than_mate2() {
        let mut reader = reader("@r\nAC\n+\nEE\n", "@r\nGT\n+\nEE\n@s\nGG\n+\nEE\n");
        assert!(reader.next_pair().unwrap().is_some());
        let err = reader.next_pair().unwrap_err();
        assert!(err.to_string().contains("file r1.fq truncated at line 5"));
    }

    #[test]
    fn test_missing_markers() {
        let mut reader1 = reader("r\nAC\n+\nEE\n", "@r\nGT\n+\nEE\n");
        let err = reader1.next_pair().unwrap_err();
        assert!(err
            .to_string()
            .contains("expecting r1.fq line 1 to start with '@'"));

        let mut reader2 = reader("@r\nAC\n+\nEE\n", "@r\nGT\n-\nEE\n");
        let err = reader2.next_pair().unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::RecordFormat));
        assert!(err
            .to_string()
            .contains("expecting r2.fq line 3 to start with '+'"));
    }
}
