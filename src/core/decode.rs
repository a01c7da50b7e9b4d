// Incremental byte-to-char decoding
//
// Reads the underlying byte stream in fixed chunks and decodes each chunk
// with an encoding_rs decoder, so only one chunk of raw bytes and its
// decoded text are held at a time. Malformed byte sequences decode to
// U+FFFD. A leading BOM selects UTF-8/UTF-16 and is stripped by the
// decoder, matching what a platform text reader does.

use encoding_rs::{CoderResult, Decoder, Encoding};
use std::io::{self, Read};

/// Raw bytes pulled from the source per read call.
pub const READ_CHUNK: usize = 8 * 1024;

pub struct DecodedChars<R> {
    reader: R,
    decoder: Decoder,
    raw: Box<[u8]>,
    /// Decoded text of the current chunk
    text: String,
    /// Byte offset of the next char in `text`
    pos: usize,
    /// True once the decoder has been flushed with `last = true`
    finished: bool,
}

impl<R: Read> DecodedChars<R> {
    pub fn new(reader: R, encoding: &'static Encoding) -> Self {
        DecodedChars {
            reader,
            decoder: encoding.new_decoder(),
            raw: vec![0u8; READ_CHUNK].into_boxed_slice(),
            text: String::new(),
            pos: 0,
            finished: false,
        }
    }

    /// Refill `text` with the next non-empty decoded chunk.
    /// Returns `Ok(false)` once the source is exhausted.
    fn fill(&mut self) -> io::Result<bool> {
        self.text.clear();
        self.pos = 0;

        while self.text.is_empty() {
            if self.finished {
                return Ok(false);
            }

            let n = match self.reader.read(&mut self.raw) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let last = n == 0;

            let mut input = &self.raw[..n];
            loop {
                let needed = self
                    .decoder
                    .max_utf8_buffer_length(input.len())
                    .unwrap_or(READ_CHUNK * 3);
                self.text.reserve(needed);
                let (result, read, _had_errors) =
                    self.decoder.decode_to_string(input, &mut self.text, last);
                input = &input[read..];
                match result {
                    CoderResult::InputEmpty => break,
                    CoderResult::OutputFull => continue,
                }
            }

            if last {
                self.finished = true;
            }
        }

        Ok(true)
    }
}

impl<R: Read> Iterator for DecodedChars<R> {
    type Item = io::Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
        let c = self.text[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(Ok(c))
    }
}
