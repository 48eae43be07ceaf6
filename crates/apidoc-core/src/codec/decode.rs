//! Schema-driven decoding of one block's markup into a node tree.

use super::schema::{FieldKind, Node, Schema, Usage};
use crate::message::{MessageKey, SyntaxError};
use crate::position::{Position, Range, Span};
use crate::token::{StartElement, Token, Tokenizer};
use std::collections::HashSet;
use std::path::Path;

/// Decodes nodes from a token stream.
///
/// The first error ends decoding of the block. In lenient mode unknown
/// attributes, unknown elements and stray text are skipped; in strict mode
/// each is an error.
pub struct Decoder<'a> {
    tokens: Tokenizer<'a>,
    strict: bool,
}

impl<'a> Decoder<'a> {
    /// `start` is the file position of the first byte of `text`.
    pub fn new(file: &'a Path, text: &'a str, start: Position, strict: bool) -> Self {
        Self {
            tokens: Tokenizer::new(file, text, start),
            strict,
        }
    }

    pub fn file(&self) -> &'a Path {
        self.tokens.file()
    }

    pub(crate) fn error(&self, range: Range, key: MessageKey) -> SyntaxError {
        SyntaxError::decode(self.file(), range, key)
    }

    /// Decode the first element of the text as `N`.
    pub fn decode_root<N: Node>(&mut self) -> Result<N, SyntaxError> {
        loop {
            let at = self.tokens.position();
            match self.tokens.next_token()? {
                Some(Token::Start(start)) => {
                    if let Some(root) = N::schema().root() {
                        if start.name.local != root {
                            return Err(self
                                .error(start.name.range, MessageKey::UnknownElement)
                                .with_field(start.name.qualified()));
                        }
                    }
                    return self.decode_node(start);
                }
                Some(Token::Text(t)) if t.value.trim().is_empty() => {}
                Some(Token::Comment(_) | Token::Instruction(_)) => {}
                Some(Token::Text(t) | Token::CData(t)) => {
                    return Err(self.error(t.range, MessageKey::UnexpectedText));
                }
                Some(Token::End(end)) => {
                    return Err(self
                        .error(end.range, MessageKey::MismatchedEndTag)
                        .with_field(end.name.qualified()));
                }
                None => {
                    let mut err = self.error(Range::new(at, at), MessageKey::Required);
                    if let Some(root) = N::schema().root() {
                        err = err.with_field(root);
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Decode the element opened by `start` as `N`, consuming through its
    /// end tag.
    pub fn decode_node<N: Node>(&mut self, start: StartElement) -> Result<N, SyntaxError> {
        let schema = N::schema();
        let mut node = N::default();

        let mut seen = HashSet::new();
        for attr in &start.attributes {
            if attr.name.is_namespace_decl() {
                continue;
            }
            if !seen.insert(attr.name.qualified()) {
                return Err(self
                    .error(attr.name.range, MessageKey::DuplicateValue)
                    .with_field(attr.name.qualified()));
            }
            match schema.attribute(&attr.name.local) {
                Some(field) if field.usage == Usage::OutputOnly => {}
                Some(field) => {
                    if let FieldKind::Attr(slot) = &field.kind {
                        slot.set(&mut node, &attr.value, attr.value_range)
                            .map_err(|key| self.error(attr.value_range, key).with_field(field.name))?;
                        // An optional zero reads the same as an absent one.
                        if field.usage == Usage::Optional && slot.is_zero(&node) {
                            slot.clear(&mut node);
                        }
                    }
                }
                None if self.strict => {
                    return Err(self
                        .error(attr.name.range, MessageKey::UnknownAttribute)
                        .with_field(attr.name.qualified()));
                }
                None => {}
            }
        }

        let close = if start.self_closing {
            start.range
        } else {
            self.decode_children(schema, &mut node, &start)?
        };
        node.set_span(Span(Range::new(start.range.start, close.end)));

        for field in schema.fields() {
            if field.usage == Usage::Required && !field.is_set(&node) {
                let name = if field.is_content() { start.name.local.as_str() } else { field.name };
                return Err(self.error(close, MessageKey::Required).with_field(name));
            }
        }
        Ok(node)
    }

    /// Children and text of a non-empty element. Returns the end tag's range.
    fn decode_children<N: Node>(
        &mut self,
        schema: &'static Schema<N>,
        node: &mut N,
        start: &StartElement,
    ) -> Result<Range, SyntaxError> {
        let content = schema.content();
        let mut text = String::new();
        let mut text_range: Option<Range> = None;

        let close = loop {
            let Some(token) = self.tokens.next_token()? else {
                return Err(self
                    .error(start.range, MessageKey::NotFoundEndTag)
                    .with_field(start.name.qualified()));
            };
            match token {
                Token::Start(child) => match schema.element(&child.name.local) {
                    Some((_, slot)) => slot.decode(node, self, child)?,
                    None if self.strict => {
                        return Err(self
                            .error(child.name.range, MessageKey::UnknownElement)
                            .with_field(child.name.qualified()));
                    }
                    None => self.skip(child)?,
                },
                Token::End(end) => {
                    if end.name.qualified() != start.name.qualified() {
                        return Err(self
                            .error(end.range, MessageKey::MismatchedEndTag)
                            .with_field(end.name.qualified()));
                    }
                    break end.range;
                }
                Token::Text(t) | Token::CData(t) => {
                    if content.is_some() {
                        text.push_str(&t.value);
                        text_range = Some(match text_range {
                            Some(r) => Range::new(r.start, t.range.end),
                            None => t.range,
                        });
                    } else if self.strict && !t.value.trim().is_empty() {
                        return Err(self.error(t.range, MessageKey::UnexpectedText));
                    }
                }
                Token::Comment(_) | Token::Instruction(_) => {}
            }
        };

        if let (Some((_, cdata, slot)), Some(range)) = (content, text_range) {
            if !text.trim().is_empty() {
                let value = if cdata { text.as_str() } else { text.trim() };
                slot.set(node, value, range)
                    .map_err(|key| self.error(range, key).with_field(start.name.local.as_str()))?;
            }
        }
        Ok(close)
    }

    /// Consume an unrecognized element and everything inside it.
    fn skip(&mut self, start: StartElement) -> Result<(), SyntaxError> {
        if start.self_closing {
            return Ok(());
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.tokens.next_token()? {
                Some(Token::Start(s)) if !s.self_closing => depth += 1,
                Some(Token::End(_)) => depth -= 1,
                Some(_) => {}
                None => {
                    return Err(self
                        .error(start.range, MessageKey::NotFoundEndTag)
                        .with_field(start.name.qualified()));
                }
            }
        }
        Ok(())
    }
}
