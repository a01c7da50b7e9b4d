// Two-character lookahead over a decoded character stream
//
// Two characters are the minimum needed to tell `\r\n` from a lone `\r`
// and `""` from a lone quote without backtracking. The buffer is the only
// thing that pulls from the stream.

use std::fmt;
use std::io;
use std::iter::Fuse;

/// Returned by `read_char` when the stream is already exhausted.
pub const END_SENTINEL: char = '\0';

pub struct LookaheadBuffer<I> {
    chars: Fuse<I>,
    c1: Option<char>,
    c2: Option<char>,
    position: usize,
}

impl<I> LookaheadBuffer<I>
where
    I: Iterator<Item = io::Result<char>>,
{
    /// Prime the window with the first two characters of the stream.
    pub fn new(chars: I) -> io::Result<Self> {
        let mut chars = chars.fuse();
        let c1 = chars.next().transpose()?;
        let c2 = match c1 {
            Some(_) => chars.next().transpose()?,
            None => None,
        };
        Ok(LookaheadBuffer {
            chars,
            c1,
            c2,
            position: 0,
        })
    }

    /// True when no characters remain, buffered ones included.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.c1.is_none()
    }

    /// Compare the lookahead against a 1- or 2-character literal.
    ///
    /// # Panics
    ///
    /// Panics if `s` is empty or longer than two characters.
    pub fn starts_with(&self, s: &str) -> bool {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(a), None, None) => self.c1 == Some(a),
            (Some(a), Some(b), None) => self.c1 == Some(a) && self.c2 == Some(b),
            _ => panic!(
                "lookahead literal must be 1 or 2 characters, got {:?}",
                s
            ),
        }
    }

    #[inline]
    pub fn starts_with_char(&self, c: char) -> bool {
        self.c1 == Some(c)
    }

    #[inline]
    pub fn starts_with_newline(&self) -> bool {
        matches!(self.c1, Some('\r') | Some('\n'))
    }

    /// Consume any run of `\r\n`, `\r` and `\n`.
    pub fn skip_newlines(&mut self) -> io::Result<()> {
        loop {
            if self.starts_with("\r\n") {
                self.drop(2)?;
            } else if self.starts_with_newline() {
                self.drop(1)?;
            } else {
                return Ok(());
            }
        }
    }

    pub fn drop(&mut self, count: usize) -> io::Result<()> {
        for _ in 0..count {
            self.read_char()?;
        }
        Ok(())
    }

    /// Consume and return the head of the window, or `END_SENTINEL` when
    /// the stream is exhausted.
    pub fn read_char(&mut self) -> io::Result<char> {
        let Some(head) = self.c1 else {
            return Ok(END_SENTINEL);
        };
        self.c1 = self.c2;
        self.c2 = match self.c1 {
            Some(_) => self.chars.next().transpose()?,
            None => None,
        };
        self.position += 1;
        Ok(head)
    }

    /// Characters consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<I> fmt::Debug for LookaheadBuffer<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookaheadBuffer")
            .field("position", &self.position)
            .field("c1", &self.c1)
            .field("c2", &self.c2)
            .finish()
    }
}
