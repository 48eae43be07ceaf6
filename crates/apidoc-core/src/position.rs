//! Source positions and ranges.
//!
//! Every node decoded from a comment block and every reported error carries a
//! [`Range`] that points into the original source file, not into the comment
//! text, so editors can jump straight to the offending span.

use serde::Serialize;
use std::fmt;

/// A point in a source file.
///
/// `line` and `character` are 0-based; `offset` is the byte offset from the
/// start of the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, character: u32, offset: usize) -> Self {
        Self {
            line,
            character,
            offset,
        }
    }

    /// Advance past `ch`, updating line and column bookkeeping.
    pub fn advance(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.character = 0;
        } else {
            self.character += 1;
        }
    }

    /// Advance past every character of `s`.
    pub fn advance_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.advance(ch);
        }
    }
}

impl fmt::Display for Position {
    /// Renders 1-based `line:column`, the way editors and compilers print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A half-open `start..end` span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// True when `pos` falls inside the range.
    pub fn contains(&self, pos: Position) -> bool {
        self.start.offset <= pos.offset && pos.offset < self.end.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// Range attached to a decoded node.
///
/// Positions never take part in structural equality: two nodes holding the
/// same values compare equal wherever they were decoded from. This is what
/// lets `decode(encode(x)) == x` hold even though the encoded text lays the
/// markup out differently from the original comment.
#[derive(Clone, Copy, Default, Serialize)]
#[serde(transparent)]
pub struct Span(pub Range);

impl Span {
    pub fn range(&self) -> Range {
        self.0
    }
}

impl PartialEq for Span {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for Span {}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?}", self.0.start.offset, self.0.end.offset)
    }
}

impl From<Range> for Span {
    fn from(r: Range) -> Self {
        Span(r)
    }
}
