//! Final adjustments made to a sanitized document just before it is written.

use super::{text_of, Document};
use crate::codec::{Spanned, Version};
use crate::input::ConfigError;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputOptions {
    /// Keep only these tags and the APIs carrying at least one of them.
    /// Empty keeps everything.
    pub tags: Vec<String>,
    /// Replaces the document's declared version.
    pub version: Option<String>,
}

impl OutputOptions {
    /// Check the options without touching any document.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_version().map(|_| ())
    }

    /// Filter, override the version and stamp the creation time.
    pub fn apply(&self, doc: &mut Document) -> Result<(), ConfigError> {
        self.apply_at(doc, Utc::now().fixed_offset())
    }

    pub fn apply_at(&self, doc: &mut Document, now: DateTime<FixedOffset>) -> Result<(), ConfigError> {
        if let Some(version) = self.parsed_version()? {
            doc.version = Some(Spanned::new(version));
        }
        filter_tags(doc, &self.tags);
        doc.created = Some(Spanned::new(now));
        Ok(())
    }

    fn parsed_version(&self) -> Result<Option<Version>, ConfigError> {
        self.version
            .as_deref()
            .map(|v| Version::new(v).map_err(|_| ConfigError::InvalidVersion(v.to_string())))
            .transpose()
    }
}

/// Drop tags not named in `keep`, and APIs referencing none of the kept ones.
pub fn filter_tags(doc: &mut Document, keep: &[String]) {
    if keep.is_empty() {
        return;
    }
    let wanted = |name: &str| keep.iter().any(|k| k == name);

    doc.tags.retain(|tag| wanted(text_of(&tag.name)));
    let before = doc.apis.len();
    doc.apis.retain(|api| api.tags.iter().any(|tag| wanted(tag.text())));
    debug!(tags = doc.tags.len(), dropped = before - doc.apis.len(), "filtered by tag");
}
