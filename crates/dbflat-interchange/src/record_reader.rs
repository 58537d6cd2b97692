//! Streaming record scanner for arbitrary row separators

use std::io::{self, BufRead};

use bstr::ByteSlice;

use crate::DelimiterConfig;

/// Splits a byte stream into records without reading it all into memory.
///
/// For line-oriented delimiters records are lines: a trailing `\r` is stripped and
/// a final line without a newline still counts. With any other separator an
/// empty record between two separators is kept, and a non-empty remainder
/// after the last separator is yielded as the final record. An empty
/// separator yields the whole stream as a single record.
pub struct RecordReader<R> {
    reader: R,
    separator: Vec<u8>,
    line_oriented: bool,
    records_read: u64,
    exhausted: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, delimiters: &DelimiterConfig) -> Self {
        Self {
            reader,
            separator: delimiters.row_separator().as_bytes().to_vec(),
            line_oriented: delimiters.is_line_oriented(),
            records_read: 0,
            exhausted: false,
        }
    }

    /// Number of records yielded so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the next record into `out`, replacing its contents.
    ///
    /// Returns `false` once the stream is exhausted.
    pub fn next_record(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
        out.clear();
        if self.exhausted {
            return Ok(false);
        }

        let found = if self.separator.is_empty() {
            self.read_remaining(out)?
        } else if self.line_oriented {
            self.read_line(out)?
        } else {
            self.read_until_separator(out)?
        };

        if found {
            self.records_read += 1;
        } else {
            self.exhausted = true;
        }
        Ok(found)
    }

    fn read_remaining(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
        self.reader.read_to_end(out)?;
        self.exhausted = true;
        Ok(!out.is_empty())
    }

    fn read_line(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
        if self.reader.read_until(b'\n', out)? == 0 {
            return Ok(false);
        }
        if out.last() == Some(&b'\n') {
            out.pop();
            if out.last() == Some(&b'\r') {
                out.pop();
            }
        }
        Ok(true)
    }

    fn read_until_separator(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
        let sep_len = self.separator.len();
        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(!out.is_empty());
            }

            // A separator may straddle the previous chunk boundary
            let previous_len = out.len();
            let search_from = previous_len.saturating_sub(sep_len - 1);
            out.extend_from_slice(available);
            let chunk_len = available.len();

            if let Some(pos) = out[search_from..].find(&self.separator) {
                let record_end = search_from + pos;
                self.reader.consume(record_end + sep_len - previous_len);
                out.truncate(record_end);
                return Ok(true);
            }
            self.reader.consume(chunk_len);
        }
    }
}
