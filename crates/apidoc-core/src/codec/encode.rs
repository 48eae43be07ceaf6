//! Schema-driven encoding of a node tree back to markup.

use super::schema::{FieldKind, Node, Usage};
use crate::token::{escape_attr, escape_text};

/// Writes elements in declared field order.
///
/// Optional attributes holding a zero value are left out. Content declared
/// as CDATA is written as a CDATA section; children of an element that also
/// has text are written inline so the text round-trips exactly.
pub struct Encoder {
    out: String,
    indent: &'static str,
    depth: usize,
    inline: bool,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Compact output on a single line.
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: "",
            depth: 0,
            inline: false,
        }
    }

    /// One element per line, children indented by `indent`.
    pub fn pretty(indent: &'static str) -> Self {
        Self {
            indent,
            ..Self::new()
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn break_line(&mut self) {
        if self.indent.is_empty() || self.inline {
            return;
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..self.depth {
            self.out.push_str(self.indent);
        }
    }

    /// Write `node` as an element named `name`.
    pub fn element<N: Node>(&mut self, name: &str, node: &N) {
        let schema = N::schema();

        self.break_line();
        self.out.push('<');
        self.out.push_str(name);

        let mut content = None;
        let mut has_children = false;
        for field in schema.fields() {
            match &field.kind {
                FieldKind::Attr(slot) => {
                    if field.usage != Usage::Required && slot.is_zero(node) {
                        continue;
                    }
                    if let Some(value) = slot.format(node) {
                        self.out.push(' ');
                        self.out.push_str(field.name);
                        self.out.push_str("=\"");
                        self.out.push_str(&escape_attr(&value));
                        self.out.push('"');
                    }
                }
                FieldKind::Content { cdata, slot } => {
                    content = slot.format(node).map(|text| (*cdata, text));
                }
                FieldKind::Elem(slot) => has_children |= slot.is_set(node),
            }
        }

        if content.is_none() && !has_children {
            self.out.push_str("/>");
            return;
        }
        self.out.push('>');

        let was_inline = self.inline;
        if let Some((cdata, text)) = &content {
            if *cdata {
                self.out.push_str("<![CDATA[");
                self.out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
                self.out.push_str("]]>");
            } else {
                self.out.push_str(&escape_text(text));
            }
            self.inline = true;
        }

        self.depth += 1;
        for field in schema.fields() {
            if let FieldKind::Elem(slot) = &field.kind {
                slot.encode(node, field.name, self);
            }
        }
        self.depth -= 1;

        if has_children {
            self.break_line();
        }
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self.inline = was_inline;
    }
}

/// Encode `node` under its schema's root name (`node` when it has none).
pub fn encode<N: Node>(node: &N) -> String {
    encode_with(Encoder::new(), node)
}

/// Like [`encode`], indented for reading.
pub fn encode_pretty<N: Node>(node: &N) -> String {
    encode_with(Encoder::pretty("  "), node)
}

fn encode_with<N: Node>(mut enc: Encoder, node: &N) -> String {
    let name = N::schema().root().unwrap_or("node");
    enc.element(name, node);
    enc.finish()
}
