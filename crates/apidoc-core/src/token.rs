//! Markup tokenizer.
//!
//! Splits the normalized text of a comment block into start tags (with their
//! attributes), end tags, character data, CDATA sections, comments and
//! processing instructions. Every token carries file positions; malformed
//! markup comes back as a [`SyntaxError`], never a panic.

use crate::message::{MessageKey, SyntaxError};
use crate::position::{Position, Range};
use std::path::Path;

/// Element or attribute name, `prefix:local` or just `local`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub prefix: String,
    pub local: String,
    pub range: Range,
}

impl Name {
    pub fn qualified(&self) -> String {
        if self.prefix.is_empty() {
            self.local.clone()
        } else {
            format!("{}:{}", self.prefix, self.local)
        }
    }

    /// Namespace declarations (`xmlns`, `xmlns:x`) carry no document data.
    pub fn is_namespace_decl(&self) -> bool {
        self.prefix == "xmlns" || (self.prefix.is_empty() && self.local == "xmlns")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: Name,
    /// Entity-decoded value.
    pub value: String,
    /// Range of the value between the quotes.
    pub value_range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub name: Name,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: Name,
    pub range: Range,
}

/// Character data, CDATA, comment or instruction payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub value: String,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start(StartElement),
    End(EndElement),
    Text(Text),
    CData(Text),
    Comment(Text),
    Instruction(Text),
}

/// Pull tokenizer over one block's markup.
pub struct Tokenizer<'a> {
    file: &'a Path,
    text: &'a str,
    /// Index into `text`.
    idx: usize,
    /// File position of `text[idx]`.
    pos: Position,
}

impl<'a> Tokenizer<'a> {
    /// `start` is the file position of `text`'s first byte.
    pub fn new(file: &'a Path, text: &'a str, start: Position) -> Self {
        Self {
            file,
            text,
            idx: 0,
            pos: start,
        }
    }

    pub fn file(&self) -> &'a Path {
        self.file
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.text[self.idx..]
    }

    fn advance(&mut self, len: usize) {
        let end = (self.idx + len).min(self.text.len());
        self.pos.advance_str(&self.text[self.idx..end]);
        self.idx = end;
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.rest().chars().next()?;
        self.advance(ch.len_utf8());
        Some(ch)
    }

    fn skip_space(&mut self) {
        let n = self.rest().len() - self.rest().trim_start().len();
        self.advance(n);
    }

    fn error(&self, range: Range, key: MessageKey) -> SyntaxError {
        SyntaxError::decode(self.file, range, key)
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        if self.idx >= self.text.len() {
            return Ok(None);
        }
        let start = self.pos;

        if self.rest().starts_with("<!--") {
            self.advance(4);
            let value = self.read_until(start, "-->")?;
            return Ok(Some(Token::Comment(Text {
                value,
                range: Range::new(start, self.pos),
            })));
        }
        if self.rest().starts_with("<![CDATA[") {
            self.advance(9);
            let value = self.read_until(start, "]]>")?;
            return Ok(Some(Token::CData(Text {
                value,
                range: Range::new(start, self.pos),
            })));
        }
        if self.rest().starts_with("<?") {
            self.advance(2);
            let value = self.read_until(start, "?>")?;
            return Ok(Some(Token::Instruction(Text {
                value,
                range: Range::new(start, self.pos),
            })));
        }
        if self.rest().starts_with("</") {
            self.advance(2);
            let name = self.read_name()?;
            self.skip_space();
            if !self.rest().starts_with('>') {
                return Err(self.error(Range::new(start, self.pos), MessageKey::InvalidMarkup));
            }
            self.advance(1);
            return Ok(Some(Token::End(EndElement {
                name,
                range: Range::new(start, self.pos),
            })));
        }
        if self.rest().starts_with('<') {
            self.advance(1);
            return self.read_start(start).map(|s| Some(Token::Start(s)));
        }

        let len = self.rest().find('<').unwrap_or(self.rest().len());
        let raw = &self.rest()[..len];
        self.advance(len);
        Ok(Some(Token::Text(Text {
            value: unescape(raw),
            range: Range::new(start, self.pos),
        })))
    }

    fn read_until(&mut self, start: Position, delim: &str) -> Result<String, SyntaxError> {
        match self.rest().find(delim) {
            Some(i) => {
                let value = self.rest()[..i].to_string();
                self.advance(i + delim.len());
                Ok(value)
            }
            None => {
                self.advance(self.rest().len());
                Err(self.error(Range::new(start, self.pos), MessageKey::NotFoundEndTag))
            }
        }
    }

    fn read_name(&mut self) -> Result<Name, SyntaxError> {
        let start = self.pos;
        let rest = self.rest();
        let valid_first = rest.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_');
        if !valid_first {
            return Err(self.error(Range::new(start, start), MessageKey::InvalidMarkup));
        }
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
            .unwrap_or(rest.len());
        let full = &rest[..len];
        self.advance(len);
        let (prefix, local) = match full.split_once(':') {
            Some((p, l)) => (p.to_string(), l.to_string()),
            None => (String::new(), full.to_string()),
        };
        if local.is_empty() {
            return Err(self.error(Range::new(start, self.pos), MessageKey::InvalidMarkup));
        }
        Ok(Name {
            prefix,
            local,
            range: Range::new(start, self.pos),
        })
    }

    fn read_start(&mut self, start: Position) -> Result<StartElement, SyntaxError> {
        let name = self.read_name()?;
        let mut attributes = Vec::new();
        loop {
            let before_space = self.idx;
            self.skip_space();
            if self.rest().starts_with("/>") {
                self.advance(2);
                return Ok(StartElement {
                    name,
                    attributes,
                    self_closing: true,
                    range: Range::new(start, self.pos),
                });
            }
            if self.rest().starts_with('>') {
                self.advance(1);
                return Ok(StartElement {
                    name,
                    attributes,
                    self_closing: false,
                    range: Range::new(start, self.pos),
                });
            }
            if self.idx >= self.text.len() {
                return Err(self.error(Range::new(start, self.pos), MessageKey::NotFoundEndTag));
            }
            // Attributes must be separated from what precedes them.
            if self.idx == before_space {
                return Err(self.error(Range::new(self.pos, self.pos), MessageKey::InvalidMarkup));
            }
            attributes.push(self.read_attribute()?);
        }
    }

    fn read_attribute(&mut self) -> Result<Attribute, SyntaxError> {
        let name = self.read_name()?;
        self.skip_space();
        if !self.rest().starts_with('=') {
            return Err(self.error(name.range, MessageKey::InvalidMarkup));
        }
        self.advance(1);
        self.skip_space();

        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error(Range::new(self.pos, self.pos), MessageKey::InvalidMarkup)),
        };
        self.bump();
        let value_start = self.pos;
        let Some(len) = self.rest().find(quote) else {
            self.advance(self.rest().len());
            return Err(self.error(Range::new(value_start, self.pos), MessageKey::InvalidMarkup));
        };
        let raw = &self.rest()[..len];
        self.advance(len);
        let value_range = Range::new(value_start, self.pos);
        self.bump();

        Ok(Attribute {
            name,
            value: unescape(raw),
            value_range,
        })
    }
}

/// Decode the predefined and numeric character references.
///
/// Unknown references are kept verbatim.
pub fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape character data.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Escape an attribute value for double quotes.
pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
