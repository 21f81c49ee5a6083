//! Source positions attached to symbols and errors so failures can
//! point back into the raw source stream.

use std::fmt;

/// An inclusive byte range in the raw source stream. Commentary bytes
/// count toward offsets, so reported positions match the file on disk.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

impl Position {
    /// A position covering the single byte at `offset`.
    pub fn at(offset: usize) -> Self {
        Position {
            start: offset,
            end: offset,
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
