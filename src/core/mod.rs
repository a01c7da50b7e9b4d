// Core primitives for CSV row reading

pub mod column;
pub mod decode;
pub mod delimiter;
pub mod lookahead;

pub use column::{parse_column, read_row};
pub use decode::DecodedChars;
pub use delimiter::Delimiter;
pub use lookahead::{LookaheadBuffer, END_SENTINEL};
