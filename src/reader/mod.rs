// Row-level API over the core state machine

pub mod parser;
pub mod row;
pub mod row_reader;
pub mod source;

pub use parser::CsvParser;
pub use row::{to_display_text, Row};
pub use row_reader::{ReaderOptions, RowReader};
pub use source::{MemorySource, Source};
