// Error taxonomy for the row reader
//
// Coercion failures are not represented here: a cell that does not parse
// as the requested type is `None` at the accessor.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    /// The source could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End of input was reached inside an open quoted region.
    ///
    /// `position` is the character offset where the offending column began.
    /// The pass is terminal: the reader does not resynchronize.
    #[error("bad CSV format: column is not closed with double quotes: pos={position}")]
    UnterminatedColumn { position: usize },

    /// A parsed column stopped on something other than a delimiter, a
    /// newline or end of input.
    #[error("internal error: column ending at pos={position} is not trailed by a delimiter or newline")]
    ColumnNotTrailed { position: usize },

    #[error("unknown character encoding: {0}")]
    UnknownEncoding(String),

    #[error("unsupported delimiter: {0:?}")]
    UnsupportedDelimiter(String),

    #[error("reader is closed: {origin}")]
    Closed { origin: String },
}

pub type Result<T> = std::result::Result<T, CsvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unterminated_column_message_carries_position() {
        let err = CsvError::UnterminatedColumn { position: 2 };
        assert_eq!(
            err.to_string(),
            "bad CSV format: column is not closed with double quotes: pos=2"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let err: CsvError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, CsvError::Io(_)));
    }
}
