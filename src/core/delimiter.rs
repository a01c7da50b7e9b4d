// Field separators

use crate::error::CsvError;
use std::fmt;
use std::str::FromStr;

/// The single-character field separator of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    #[inline]
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }

    /// Map a separator character back to a delimiter.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ',' => Some(Delimiter::Comma),
            '\t' => Some(Delimiter::Tab),
            _ => None,
        }
    }

    /// Map a separator byte (as sent from Elixir: `?,` or `?\t`).
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::from_char(byte as char)
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => f.write_str("comma"),
            Delimiter::Tab => f.write_str("tab"),
        }
    }
}

/// Accepts the literal separator (`","`, `"\t"`) or its name (`"comma"`, `"tab"`).
impl FromStr for Delimiter {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(delimiter) = Delimiter::from_char(c) {
                return Ok(delimiter);
            }
        }
        match s.to_ascii_lowercase().as_str() {
            "comma" => Ok(Delimiter::Comma),
            "tab" => Ok(Delimiter::Tab),
            _ => Err(CsvError::UnsupportedDelimiter(s.to_string())),
        }
    }
}
