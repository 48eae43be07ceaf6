//! JSON renderer: the document tree as serde sees it, for tooling.

use crate::render::Renderer;
use anyhow::{Context, Result};
use apidoc_core::Document;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, doc: &Document) -> Result<String> {
        let mut out = serde_json::to_string_pretty(doc).context("failed to serialize document")?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
