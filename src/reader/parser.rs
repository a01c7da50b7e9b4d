// Parser: a source plus options that hands out independent readers

use super::row_reader::{ReaderOptions, RowReader};
use super::source::Source;
use crate::error::Result;

/// Each call to [`CsvParser::rows`] opens its own stream, so several passes
/// over the same source can be live at once without sharing state.
#[derive(Debug, Clone)]
pub struct CsvParser<S> {
    source: S,
    options: ReaderOptions,
}

impl<S: Source + Clone> CsvParser<S> {
    pub fn new(source: S, options: ReaderOptions) -> Self {
        CsvParser { source, options }
    }

    pub fn rows(&self) -> Result<RowReader<S>> {
        RowReader::open(self.source.clone(), self.options)
    }

    pub fn options(&self) -> ReaderOptions {
        self.options
    }
}
