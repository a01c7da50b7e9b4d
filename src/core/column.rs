// Column and row state machine
//
// A row is a run of columns separated by the delimiter and terminated by
// a newline sequence or end of input. Each column is parsed by a single
// loop over two states; quoted regions may start anywhere in a column and
// content may continue after the closing quote (`"ab"cd` is `abcd`).

use super::delimiter::Delimiter;
use super::lookahead::LookaheadBuffer;
use crate::error::{CsvError, Result};
use std::io;

const QUOTE: char = '"';
const ESCAPED_QUOTE: &str = "\"\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quoting {
    Outside,
    Inside,
}

/// Parse one column, leaving the buffer on its terminator (delimiter,
/// newline or end of input).
///
/// A column that starts on a terminator is empty and consumes nothing.
pub fn parse_column<I>(buffer: &mut LookaheadBuffer<I>, delimiter: Delimiter) -> Result<String>
where
    I: Iterator<Item = io::Result<char>>,
{
    let sep = delimiter.as_char();
    if buffer.starts_with_newline() || buffer.starts_with_char(sep) {
        return Ok(String::new());
    }

    let start = buffer.position();
    let mut field = String::new();
    let mut state = Quoting::Outside;

    loop {
        match state {
            Quoting::Outside => {
                if buffer.at_end() || buffer.starts_with_newline() || buffer.starts_with_char(sep) {
                    return Ok(field);
                }
                // `""` opening a column is an empty quoted region, not an escape
                if buffer.position() > start && buffer.starts_with(ESCAPED_QUOTE) {
                    field.push(QUOTE);
                    buffer.drop(2)?;
                } else if buffer.starts_with_char(QUOTE) {
                    buffer.drop(1)?;
                    state = Quoting::Inside;
                } else {
                    field.push(buffer.read_char()?);
                    while !buffer.at_end()
                        && !buffer.starts_with_char(QUOTE)
                        && !buffer.starts_with_newline()
                        && !buffer.starts_with_char(sep)
                    {
                        field.push(buffer.read_char()?);
                    }
                }
            }
            Quoting::Inside => {
                if buffer.at_end() {
                    return Err(CsvError::UnterminatedColumn { position: start });
                }
                if buffer.starts_with(ESCAPED_QUOTE) {
                    field.push(QUOTE);
                    buffer.drop(2)?;
                } else if buffer.starts_with_char(QUOTE) {
                    buffer.drop(1)?;
                    state = Quoting::Outside;
                } else {
                    // delimiters and newlines are plain text in here
                    while !buffer.at_end() && !buffer.starts_with_char(QUOTE) {
                        field.push(buffer.read_char()?);
                    }
                }
            }
        }
    }
}

/// Read the next row, or `None` at end of input.
///
/// Expects the buffer to sit at the start of a record (leading newlines
/// already skipped). Trailing newline runs, blank lines included, are
/// consumed with the row.
pub fn read_row<I>(buffer: &mut LookaheadBuffer<I>, delimiter: Delimiter) -> Result<Option<Vec<String>>>
where
    I: Iterator<Item = io::Result<char>>,
{
    if buffer.at_end() {
        return Ok(None);
    }

    let sep = delimiter.as_char();
    let mut cells = Vec::new();
    loop {
        cells.push(parse_column(buffer, delimiter)?);

        if buffer.at_end() {
            return Ok(Some(cells));
        } else if buffer.starts_with_newline() {
            buffer.skip_newlines()?;
            return Ok(Some(cells));
        } else if buffer.starts_with_char(sep) {
            buffer.drop(1)?;
        } else {
            return Err(CsvError::ColumnNotTrailed {
                position: buffer.position(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(input: &str, delimiter: Delimiter) -> Result<Vec<Vec<String>>> {
        let mut buffer = LookaheadBuffer::new(input.chars().map(Ok))?;
        buffer.skip_newlines()?;
        let mut out = Vec::new();
        while let Some(row) = read_row(&mut buffer, delimiter)? {
            out.push(row);
        }
        Ok(out)
    }

    fn column(input: &str) -> String {
        let mut buffer = LookaheadBuffer::new(input.chars().map(Ok)).unwrap();
        parse_column(&mut buffer, Delimiter::Comma).unwrap()
    }

    #[test]
    fn test_empty_column_consumes_nothing() {
        let mut buffer = LookaheadBuffer::new(",x".chars().map(Ok)).unwrap();
        assert_eq!(parse_column(&mut buffer, Delimiter::Comma).unwrap(), "");
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn test_empty_quoted_column() {
        assert_eq!(column("\"\",x"), "");
        assert_eq!(rows("\"\",,\"\"", Delimiter::Comma).unwrap(), vec![vec!["", "", ""]]);
    }

    #[test]
    fn test_text_after_closing_quote() {
        assert_eq!(column("\"ab\"cd,x"), "abcd");
    }

    #[test]
    fn test_escaped_quote_outside_quotes() {
        assert_eq!(column("ab\"\"cd"), "ab\"cd");
    }

    #[test]
    fn test_quote_only_column() {
        // open, escaped pair, close
        assert_eq!(column("\"\"\"\""), "\"");
    }

    #[test]
    fn test_newline_and_delimiter_inside_quotes() {
        assert_eq!(column("\"a,\r\nb\"\n"), "a,\r\nb");
    }

    #[test]
    fn test_tab_delimiter_keeps_commas() {
        assert_eq!(
            rows("a,b\tc\n", Delimiter::Tab).unwrap(),
            vec![vec!["a,b", "c"]]
        );
    }

    #[test]
    fn test_trailing_delimiter_yields_empty_cell() {
        // every delimiter closes a column, including one right before end
        // of input; `a,` is two cells, not one
        assert_eq!(rows("a,", Delimiter::Comma).unwrap(), vec![vec!["a", ""]]);
        assert_eq!(rows("a,\nb", Delimiter::Comma).unwrap(), vec![vec!["a", ""], vec!["b"]]);
    }

    #[test]
    fn test_blank_lines_between_records_are_skipped() {
        assert_eq!(
            rows("\n\na\r\n\r\nb\r\r", Delimiter::Comma).unwrap(),
            vec![vec!["a"], vec!["b"]]
        );
    }

    #[test]
    fn test_unterminated_reports_column_start() {
        let err = rows("x\nab,cd\"ef", Delimiter::Comma).unwrap_err();
        // column `cd"ef` starts after `x\nab,`
        assert!(matches!(err, CsvError::UnterminatedColumn { position: 5 }));
    }
}
