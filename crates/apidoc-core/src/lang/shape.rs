//! Block shapes: how a comment (or a string literal to step over) starts,
//! where it ends, and how its text is turned into markup.
//!
//! Normalized text keeps the exact byte layout of the raw comment. Comment
//! delimiters and per-line prefix characters are overwritten with spaces, so
//! a position inside the normalized markup is also a position in the file.

use super::lexer::Lexer;

/// One recognizable region of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// String literal. Consumed and skipped so comment delimiters inside
    /// strings are never mistaken for comments.
    Str {
        begin: &'static str,
        end: &'static str,
        escape: Option<char>,
    },
    /// `// ...` style comment. Contiguous lines of the same style merge into
    /// one block; `prefix` characters right after the delimiter are stripped
    /// (`///`, `//!`, `##`).
    Line {
        begin: &'static str,
        prefix: &'static str,
    },
    /// `/* ... */` style comment whose delimiters may sit mid-line.
    Block {
        begin: &'static str,
        end: &'static str,
        prefix: &'static str,
    },
    /// Like [`Shape::Block`] but nested pairs balance (`/* /* */ */`).
    Nested {
        begin: &'static str,
        end: &'static str,
        prefix: &'static str,
    },
    /// Delimiters each occupy a whole line by themselves (`=begin` / `=end`).
    LineAnchored {
        begin: &'static str,
        end: &'static str,
        prefix: &'static str,
    },
}

/// Text consumed by a comment shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumed<'a> {
    pub raw: &'a str,
    pub data: String,
}

impl Shape {
    pub const fn string(begin: &'static str, end: &'static str, escape: Option<char>) -> Self {
        Shape::Str { begin, end, escape }
    }

    pub const fn line(begin: &'static str, prefix: &'static str) -> Self {
        Shape::Line { begin, prefix }
    }

    pub const fn block(begin: &'static str, end: &'static str, prefix: &'static str) -> Self {
        Shape::Block { begin, end, prefix }
    }

    pub const fn nested(begin: &'static str, end: &'static str, prefix: &'static str) -> Self {
        Shape::Nested { begin, end, prefix }
    }

    pub const fn line_anchored(begin: &'static str, end: &'static str, prefix: &'static str) -> Self {
        Shape::LineAnchored { begin, end, prefix }
    }

    /// False for string literals, which are stepped over but never emitted.
    pub fn is_comment(&self) -> bool {
        !matches!(self, Shape::Str { .. })
    }

    /// True when single-line comments of this shape merge with neighbours.
    pub fn is_single_line(&self) -> bool {
        matches!(self, Shape::Line { .. })
    }

    /// Does a region of this shape start at the cursor?
    pub fn begins_at(&self, l: &Lexer) -> bool {
        match *self {
            Shape::Str { begin, .. }
            | Shape::Line { begin, .. }
            | Shape::Block { begin, .. }
            | Shape::Nested { begin, .. } => l.starts_with(begin),
            Shape::LineAnchored { begin, .. } => {
                l.at_line_start() && l.peek_line().trim_end() == begin
            }
        }
    }

    /// Consume from the cursor (which [`Shape::begins_at`] accepted) through
    /// the end delimiter.
    ///
    /// `blocks` is the language's full shape list; a line comment stops
    /// merging where the next line opens some other shape.
    ///
    /// `None` means a comment's end delimiter never appeared; the cursor is
    /// then at end of input. An unclosed string literal instead ends with its
    /// line.
    pub fn consume_until_end<'a>(&self, l: &mut Lexer<'a>, blocks: &[Shape]) -> Option<Consumed<'a>> {
        let start = l.position();
        match *self {
            Shape::Str { begin, end, escape } => {
                let mut opening_line = l.clone();
                l.advance(begin.len());
                loop {
                    if l.at_eof() {
                        opening_line.read_line();
                        *l = opening_line;
                        break;
                    }
                    if l.matches(end) {
                        break;
                    }
                    let ch = l.bump();
                    if ch.is_some() && ch == escape {
                        l.bump();
                    }
                }
                Some(Consumed {
                    raw: l.slice_from(start),
                    data: String::new(),
                })
            }
            Shape::Line { begin, prefix } => {
                loop {
                    l.read_line();
                    let mut next = l.clone();
                    next.skip_blanks();
                    // `-- x` followed by `--[[` is two blocks.
                    if next.at_eof() || blocks.iter().find(|b| b.begins_at(&next)) != Some(self) {
                        break;
                    }
                    *l = next;
                }
                let raw = l.slice_from(start);
                Some(Consumed {
                    raw,
                    data: normalize_lines(raw, begin, prefix),
                })
            }
            Shape::Block { begin, end, prefix } => {
                l.advance(begin.len());
                if !l.skip_past(end) {
                    return None;
                }
                let raw = l.slice_from(start);
                Some(Consumed {
                    raw,
                    data: normalize_block(raw, begin.len(), end.len(), prefix),
                })
            }
            Shape::Nested { begin, end, prefix } => {
                l.advance(begin.len());
                let mut depth = 1usize;
                while depth > 0 {
                    if l.at_eof() {
                        return None;
                    }
                    if l.matches(end) {
                        depth -= 1;
                    } else if l.matches(begin) {
                        depth += 1;
                    } else {
                        l.bump();
                    }
                }
                let raw = l.slice_from(start);
                Some(Consumed {
                    raw,
                    data: normalize_block(raw, begin.len(), end.len(), prefix),
                })
            }
            Shape::LineAnchored { begin, end, prefix } => {
                l.read_line();
                let end_line_start = loop {
                    if l.at_eof() {
                        return None;
                    }
                    if l.peek_line().trim_end() == end {
                        let at = l.position().offset - start.offset;
                        l.read_line();
                        break at;
                    }
                    l.read_line();
                };
                let raw = l.slice_from(start);
                Some(Consumed {
                    raw,
                    data: normalize_anchored(raw, begin.len(), end_line_start, end.len(), prefix),
                })
            }
        }
    }
}

/// Blank `len` bytes at `at`.
fn blank(bytes: &mut [u8], at: usize, len: usize) {
    let end = (at + len).min(bytes.len());
    for b in &mut bytes[at.min(end)..end] {
        *b = b' ';
    }
}

/// Blank a run of `prefix` characters starting at `at`, returning where the
/// run stopped.
fn blank_prefix(bytes: &mut [u8], mut at: usize, prefix: &str) -> usize {
    while at < bytes.len() && prefix.as_bytes().contains(&bytes[at]) {
        bytes[at] = b' ';
        at += 1;
    }
    at
}

/// Blank leading blanks then a prefix run at the start of every line after
/// the first.
fn blank_line_prefixes(bytes: &mut [u8], prefix: &str) {
    if prefix.is_empty() {
        return;
    }
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let mut j = i + 1;
            while j < bytes.len() && matches!(bytes[j], b' ' | b'\t') {
                j += 1;
            }
            i = blank_prefix(bytes, j, prefix).max(i + 1);
        } else {
            i += 1;
        }
    }
}

fn into_text(bytes: Vec<u8>) -> String {
    // Only ASCII bytes are ever overwritten, so this never loses anything.
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn normalize_lines(raw: &str, begin: &str, prefix: &str) -> String {
    let mut bytes = raw.as_bytes().to_vec();
    let mut line_start = 0;
    while line_start < bytes.len() {
        let mut i = line_start;
        while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
            i += 1;
        }
        if bytes[i..].starts_with(begin.as_bytes()) {
            blank(&mut bytes, i, begin.len());
            blank_prefix(&mut bytes, i + begin.len(), prefix);
        }
        line_start = match bytes[line_start..].iter().position(|&b| b == b'\n') {
            Some(n) => line_start + n + 1,
            None => bytes.len(),
        };
    }
    into_text(bytes)
}

fn normalize_block(raw: &str, begin_len: usize, end_len: usize, prefix: &str) -> String {
    let mut bytes = raw.as_bytes().to_vec();
    let len = bytes.len();
    blank(&mut bytes, len.saturating_sub(end_len), end_len);
    blank(&mut bytes, 0, begin_len);
    blank_prefix(&mut bytes, begin_len, prefix);
    blank_line_prefixes(&mut bytes, prefix);
    into_text(bytes)
}

fn normalize_anchored(
    raw: &str,
    begin_len: usize,
    end_at: usize,
    end_len: usize,
    prefix: &str,
) -> String {
    let mut bytes = raw.as_bytes().to_vec();
    blank(&mut bytes, end_at, end_len);
    blank(&mut bytes, 0, begin_len);
    blank_line_prefixes(&mut bytes, prefix);
    into_text(bytes)
}
