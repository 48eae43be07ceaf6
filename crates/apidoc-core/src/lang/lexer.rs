//! Cursor over a source file's text.

use crate::position::Position;

/// Byte cursor that keeps a [`Position`] in sync with what it consumes.
#[derive(Clone)]
pub struct Lexer<'a> {
    text: &'a str,
    pos: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: Position::default(),
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn at_eof(&self) -> bool {
        self.pos.offset >= self.text.len()
    }

    /// True when nothing but the line's start precedes the cursor.
    pub fn at_line_start(&self) -> bool {
        self.pos.character == 0
    }

    /// Unconsumed text.
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos.offset..]
    }

    /// Text between `from` and the cursor.
    pub fn slice_from(&self, from: Position) -> &'a str {
        &self.text[from.offset..self.pos.offset]
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Consume `s` if the cursor is at it.
    pub fn matches(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.advance(s.len());
            true
        } else {
            false
        }
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.rest().chars().next()?;
        self.pos.advance(ch);
        Some(ch)
    }

    /// Advance `len` bytes. `len` must land on a char boundary.
    pub fn advance(&mut self, len: usize) {
        let end = (self.pos.offset + len).min(self.text.len());
        let chunk = &self.text[self.pos.offset..end];
        self.pos.advance_str(chunk);
    }

    /// Consume the rest of the current line, newline included.
    pub fn read_line(&mut self) -> &'a str {
        let start = self.pos;
        let len = match self.rest().find('\n') {
            Some(i) => i + 1,
            None => self.rest().len(),
        };
        self.advance(len);
        self.slice_from(start)
    }

    /// The current line without consuming it, line terminator excluded.
    pub fn peek_line(&self) -> &'a str {
        let rest = self.rest();
        let line = match rest.find('\n') {
            Some(i) => &rest[..i],
            None => rest,
        };
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// Consume through the first `delim`.
    ///
    /// Returns false, with the cursor at end of input, when `delim` never
    /// shows up.
    pub fn skip_past(&mut self, delim: &str) -> bool {
        match self.rest().find(delim) {
            Some(i) => {
                self.advance(i + delim.len());
                true
            }
            None => {
                self.advance(self.rest().len());
                false
            }
        }
    }

    /// Consume leading spaces and tabs.
    pub fn skip_blanks(&mut self) {
        let n = self.rest().len() - self.rest().trim_start_matches([' ', '\t']).len();
        self.advance(n);
    }
}
