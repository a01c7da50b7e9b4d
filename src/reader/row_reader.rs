// Row reader: owns one open stream and yields rows lazily
//
// Lifecycle:
// - Open: positioned before the next row, stream handle held
// - Failed: a malformed column ended the pass; handle already released
// - Closed: explicit close; every further use is an error, and rows handed
//   out earlier panic on access
//
// `reset` drops the current handle before opening a new one, so at most one
// handle is alive per reader. All stateful operations take `&mut self`;
// overlapping passes over one reader are not expressible.

use super::row::{Liveness, Row};
use super::source::Source;
use crate::core::{read_row, DecodedChars, Delimiter, LookaheadBuffer};
use crate::error::{CsvError, Result};
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

type Buffer<R> = LookaheadBuffer<DecodedChars<R>>;

/// Runtime options of a reader.
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    pub encoding: &'static Encoding,
    pub delimiter: Delimiter,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            encoding: UTF_8,
            delimiter: Delimiter::Comma,
        }
    }
}

impl ReaderOptions {
    pub fn new(encoding: &'static Encoding, delimiter: Delimiter) -> Self {
        ReaderOptions {
            encoding,
            delimiter,
        }
    }

    /// Resolve a WHATWG encoding label (`"utf-8"`, `"shift_jis"`, ...) and a
    /// delimiter label (`","`, `"\t"`, `"comma"`, `"tab"`).
    pub fn from_labels(encoding: &str, delimiter: &str) -> Result<Self> {
        let encoding = Encoding::for_label(encoding.trim().as_bytes())
            .ok_or_else(|| CsvError::UnknownEncoding(encoding.to_string()))?;
        Ok(ReaderOptions {
            encoding,
            delimiter: delimiter.parse()?,
        })
    }
}

enum ReaderState<R> {
    Open(Buffer<R>),
    Failed,
    Closed,
}

pub struct RowReader<S: Source> {
    source: S,
    options: ReaderOptions,
    state: ReaderState<S::Stream>,
    liveness: Liveness,
    rows_read: usize,
}

impl<S: Source> RowReader<S> {
    /// Open `source` and position the reader before the first row.
    pub fn open(source: S, options: ReaderOptions) -> Result<Self> {
        let buffer = open_buffer(&source, options)?;
        debug!(
            source = %source.describe(),
            encoding = options.encoding.name(),
            delimiter = %options.delimiter,
            "opened csv reader"
        );
        Ok(RowReader {
            source,
            options,
            state: ReaderState::Open(buffer),
            liveness: Liveness::new(),
            rows_read: 0,
        })
    }

    /// Read the next row.
    ///
    /// Returns `Ok(None)` at end of input, and after a malformed column has
    /// ended the pass. Returns `CsvError::Closed` once the reader is closed.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if matches!(self.state, ReaderState::Closed) {
            return Err(self.closed_error());
        }
        let ReaderState::Open(buffer) = &mut self.state else {
            return Ok(None);
        };

        match read_row(buffer, self.options.delimiter) {
            Ok(Some(cells)) => {
                self.rows_read += 1;
                Ok(Some(Row::with_liveness(
                    cells,
                    self.options.delimiter,
                    self.liveness.clone(),
                )))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(
                    source = %self.source.describe(),
                    row = self.rows_read,
                    error = %err,
                    "csv pass aborted"
                );
                // releases the stream handle
                self.state = ReaderState::Failed;
                Err(err)
            }
        }
    }

    /// Release the current stream and reopen the source from the start.
    pub fn reset(&mut self) -> Result<()> {
        if matches!(self.state, ReaderState::Closed) {
            return Err(self.closed_error());
        }
        self.state = ReaderState::Failed;
        let buffer = open_buffer(&self.source, self.options)?;
        self.state = ReaderState::Open(buffer);
        debug!(
            source = %self.source.describe(),
            rows_read = self.rows_read,
            "reset csv reader"
        );
        self.rows_read = 0;
        Ok(())
    }

    /// Release the stream. Idempotent. Rows obtained from this reader
    /// panic on access afterwards.
    pub fn close(&mut self) {
        if matches!(self.state, ReaderState::Closed) {
            return;
        }
        self.state = ReaderState::Closed;
        self.liveness.close();
        debug!(
            source = %self.source.describe(),
            rows_read = self.rows_read,
            "closed csv reader"
        );
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ReaderState::Closed)
    }

    /// Characters consumed in the current pass. Zero after a failed pass.
    pub fn position(&self) -> Result<usize> {
        match &self.state {
            ReaderState::Open(buffer) => Ok(buffer.position()),
            ReaderState::Failed => Ok(0),
            ReaderState::Closed => Err(self.closed_error()),
        }
    }

    /// Rows yielded since open or the last reset.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Take up to `max` rows; fewer means the pass is over.
    pub fn take_rows(&mut self, max: usize) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while rows.len() < max {
            match self.next_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    fn closed_error(&self) -> CsvError {
        CsvError::Closed {
            origin: self.source.describe(),
        }
    }
}

impl<S: Source> Iterator for RowReader<S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

fn open_buffer<S: Source>(source: &S, options: ReaderOptions) -> Result<Buffer<S::Stream>> {
    let stream = source.open()?;
    let mut buffer = LookaheadBuffer::new(DecodedChars::new(stream, options.encoding))?;
    buffer.skip_newlines()?;
    Ok(buffer)
}
