// Typed row: immutable cells with on-demand coercion
//
// Coercions never fail loudly: text that does not parse as the requested
// type is `None`, because missing readings are normal in the data this
// reader targets. Indexing outside the row, or touching a row after its
// reader was closed, is a caller bug and panics.

use crate::core::Delimiter;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Date-times carrying an explicit offset.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y/%m/%d %H:%M:%S%.f %z",
];

/// Date-times without zone information, read as local wall-clock time.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y年%m月%d日 %H:%M:%S",
    "%Y年%m月%d日 %H:%M",
];

/// Dates alone, read as local midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// Shared open/closed flag between a reader and the rows it produced.
#[derive(Debug, Clone)]
pub(crate) struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub(crate) fn new() -> Self {
        Liveness(Arc::new(AtomicBool::new(true)))
    }

    pub(crate) fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn close(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    cells: Box<[String]>,
    delimiter: Delimiter,
    liveness: Liveness,
}

impl Row {
    /// Build a standalone row, not tied to any reader.
    pub fn new(cells: Vec<String>, delimiter: Delimiter) -> Self {
        Self::with_liveness(cells, delimiter, Liveness::new())
    }

    pub(crate) fn with_liveness(cells: Vec<String>, delimiter: Delimiter, liveness: Liveness) -> Self {
        Row {
            cells: cells.into_boxed_slice(),
            delimiter,
            liveness,
        }
    }

    /// Number of cells. Fixed at construction.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    /// Cell text, verbatim.
    ///
    /// # Panics
    ///
    /// Panics if `index >= cell_count()` or the reader that produced this
    /// row has been closed.
    pub fn string_at(&self, index: usize) -> &str {
        self.cell(index)
    }

    pub fn int_at(&self, index: usize) -> Option<i32> {
        parse_number(self.cell(index))
    }

    pub fn long_at(&self, index: usize) -> Option<i64> {
        parse_number(self.cell(index))
    }

    pub fn double_at(&self, index: usize) -> Option<f64> {
        parse_number(self.cell(index))
    }

    /// Cell as a local date-time; zone-less text is taken as local time.
    pub fn date_at(&self, index: usize) -> Option<DateTime<Local>> {
        parse_local_datetime(self.cell(index))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.assert_open();
        self.cells.iter().map(String::as_str)
    }

    fn cell(&self, index: usize) -> &str {
        self.assert_open();
        assert!(
            index < self.cells.len(),
            "cell index {} out of range for row of {} cells",
            index,
            self.cells.len()
        );
        &self.cells[index]
    }

    #[inline]
    fn assert_open(&self) {
        assert!(self.liveness.is_open(), "reader is closed");
    }
}

impl fmt::Display for Row {
    /// `(a, b, "c\td")`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, cell) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&to_display_text(cell, self.delimiter))?;
        }
        f.write_str(")")
    }
}

/// Render a cell for diagnostics.
///
/// Cells containing `\r`, `\n`, tab or the delimiter are quoted, with
/// control characters shown as backslash escapes and quotes doubled.
/// Other cells pass through unchanged. The output is not meant to be
/// parsed back.
pub fn to_display_text(cell: &str, delimiter: Delimiter) -> Cow<'_, str> {
    let sep = delimiter.as_char();
    if !cell.chars().any(|c| matches!(c, '\r' | '\n' | '\t') || c == sep) {
        return Cow::Borrowed(cell);
    }

    let mut out = String::with_capacity(cell.len() + 2);
    out.push('"');
    for c in cell.chars() {
        match c {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\"\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

fn parse_number<T: FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

fn parse_local_datetime(text: &str) -> Option<DateTime<Local>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Local));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return local_from_naive(naive);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return local_from_naive(date.and_hms_opt(0, 0, 0)?);
        }
    }
    None
}

/// Ambiguous local times (DST fall-back) take the earlier instant;
/// nonexistent ones (DST gap) are `None`.
fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn row(cells: &[&str]) -> Row {
        Row::new(cells.iter().map(|s| s.to_string()).collect(), Delimiter::Comma)
    }

    #[test]
    fn test_integer_coercion() {
        let r = row(&["42", "abc", " -7 ", "", "+3", "2147483648"]);
        assert_eq!(r.int_at(0), Some(42));
        assert_eq!(r.int_at(1), None);
        assert_eq!(r.int_at(2), Some(-7));
        assert_eq!(r.int_at(3), None);
        assert_eq!(r.int_at(4), Some(3));
        // overflows i32 but fits i64
        assert_eq!(r.int_at(5), None);
        assert_eq!(r.long_at(5), Some(2_147_483_648));
    }

    #[test]
    fn test_double_coercion() {
        let r = row(&["128.5", "1e3", "high", "72"]);
        assert_eq!(r.double_at(0), Some(128.5));
        assert_eq!(r.double_at(1), Some(1000.0));
        assert_eq!(r.double_at(2), None);
        assert_eq!(r.double_at(3), Some(72.0));
    }

    #[test]
    fn test_naive_date_is_local_wall_clock() {
        let r = row(&[
            "2024/01/15 07:30",
            "2024-01-15",
            "2024年1月15日",
            "yesterday",
            "2024-01-15T07:30",
        ]);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap();
        assert_eq!(r.date_at(0).unwrap().naive_local(), expected);

        let midnight = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(r.date_at(1).unwrap().naive_local(), midnight);
        assert_eq!(r.date_at(2).unwrap().naive_local(), midnight);
        assert_eq!(r.date_at(3), None);
        // ISO form without seconds
        assert_eq!(r.date_at(4).unwrap().naive_local(), expected);
    }

    #[test]
    fn test_offset_date_keeps_instant() {
        let r = row(&["2024-01-15T07:30:00+09:00"]);
        let expected = Utc.with_ymd_and_hms(2024, 1, 14, 22, 30, 0).unwrap();
        assert_eq!(r.date_at(0).unwrap().with_timezone(&Utc), expected);
    }

    #[test]
    fn test_string_at_is_verbatim() {
        let r = row(&[" padded ", ""]);
        assert_eq!(r.string_at(0), " padded ");
        assert_eq!(r.string_at(1), "");
        assert_eq!(r.cell_count(), 2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_index_panics() {
        row(&["1"]).int_at(1);
    }

    #[test]
    #[should_panic(expected = "reader is closed")]
    fn test_closed_liveness_panics() {
        let liveness = Liveness::new();
        let r = Row::with_liveness(vec!["1".into()], Delimiter::Comma, liveness.clone());
        liveness.close();
        r.string_at(0);
    }

    #[test]
    fn test_display_text_quotes_special_cells() {
        assert_eq!(to_display_text("plain", Delimiter::Comma), "plain");
        assert_eq!(to_display_text("a,b", Delimiter::Comma), "\"a,b\"");
        assert_eq!(to_display_text("a,b", Delimiter::Tab), "a,b");
        assert_eq!(to_display_text("l1\r\nl2", Delimiter::Comma), "\"l1\\r\\nl2\"");
        assert_eq!(to_display_text("say \"hi\"\t", Delimiter::Comma), "\"say \"\"hi\"\"\\t\"");
        // quotes alone do not trigger quoting
        assert_eq!(to_display_text("say \"hi\"", Delimiter::Comma), "say \"hi\"");
    }

    #[test]
    fn test_row_display() {
        assert_eq!(row(&["a", "b,c", ""]).to_string(), "(a, \"b,c\", )");
    }
}
