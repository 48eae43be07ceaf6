//! Canonical markup, as written by the codec's encoder.

use crate::render::Renderer;
use anyhow::Result;
use apidoc_core::codec::encode_pretty;
use apidoc_core::Document;

pub struct XmlRenderer;

impl Renderer for XmlRenderer {
    fn render(&self, doc: &Document) -> Result<String> {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&encode_pretty(doc));
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "xml"
    }
}
