//! JSON-lines record source: one JSON object per line, read lazily.

use super::Record;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

pub struct JsonLinesSource<R> {
    reader: R,
    line: Vec<u8>,
    line_no: u64,
    malformed: u64,
    error: Option<std::io::Error>,
    done: bool,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, std::io::Error> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_no: 0,
            malformed: 0,
            error: None,
            done: false,
        }
    }

    /// Lines skipped because they were not a JSON object (including invalid UTF-8)
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// I/O error that ended the stream early, if any
    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        while !self.done {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_no += 1;
                    if self.line.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    // Bytes, not `read_line`: a line that is not UTF-8 is malformed, not an I/O failure.
                    match serde_json::from_slice::<serde_json::Value>(&self.line)
                        .ok()
                        .and_then(Record::from_json)
                    {
                        Some(record) => return Some(record),
                        None => {
                            self.malformed += 1;
                            warn!(line = self.line_no, "skipping malformed record");
                        }
                    }
                }
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "record source failed");
                    self.error = Some(e);
                    self.done = true;
                }
            }
        }
        None
    }
}
