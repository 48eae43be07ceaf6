//! Folding decoded blocks into one document.

use super::{text_of, Api, Document, Element};
use crate::codec::Node;
use crate::message::{MessageKey, SyntaxError};
use crate::position::Range;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// What to do when a second `apidoc` block redeclares document metadata.
///
/// The first declaration always wins; the policies differ only in whether a
/// materially different redeclaration is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataPolicy {
    #[default]
    RejectConflicts,
    KeepFirst,
}

struct Merge<'a> {
    file: &'a Path,
    policy: MetadataPolicy,
    errors: Vec<SyntaxError>,
}

impl Merge<'_> {
    fn conflict(&mut self, field: &str, range: Range) {
        match self.policy {
            MetadataPolicy::RejectConflicts => self.errors.push(
                SyntaxError::decode(self.file, range, MessageKey::ConflictingDeclaration).with_field(field),
            ),
            MetadataPolicy::KeepFirst => {
                debug!(file = %self.file.display(), field, "ignoring redeclared metadata");
            }
        }
    }

    fn field<V: PartialEq>(&mut self, name: &str, slot: &mut Option<V>, incoming: Option<V>, range: fn(&V) -> Range) {
        let Some(value) = incoming else { return };
        if slot.is_none() {
            *slot = Some(value);
        } else if slot.as_ref() != Some(&value) {
            self.conflict(name, range(&value));
        }
    }
}

impl Document {
    /// True once some `apidoc` block has supplied metadata.
    pub fn has_metadata(&self) -> bool {
        !self.file.as_os_str().is_empty()
    }

    /// Append an API decoded from `file`.
    pub fn append_api(&mut self, mut api: Api, file: &Path) {
        api.file = file.to_path_buf();
        self.apis.push(api);
    }

    /// Merge a document fragment decoded from `file`.
    ///
    /// Tags and servers whose name is already declared are dropped and
    /// reported at the later declaration.
    pub fn merge(&mut self, frag: Document, file: &Path, policy: MetadataPolicy) -> Vec<SyntaxError> {
        let mut m = Merge {
            file,
            policy,
            errors: Vec::new(),
        };

        for mut tag in frag.tags {
            let name = text_of(&tag.name);
            if self.tag(name).is_some() {
                let range = tag.name.as_ref().map_or(tag.span.range(), |n| n.range());
                m.errors.push(SyntaxError::decode(file, range, MessageKey::DuplicateValue).with_field("tag"));
                continue;
            }
            tag.file = file.to_path_buf();
            self.tags.push(tag);
        }
        for mut server in frag.servers {
            let name = text_of(&server.name);
            if self.server(name).is_some() {
                let range = server.name.as_ref().map_or(server.span.range(), |n| n.range());
                m.errors.push(SyntaxError::decode(file, range, MessageKey::DuplicateValue).with_field("server"));
                continue;
            }
            server.file = file.to_path_buf();
            self.servers.push(server);
        }
        for mut response in frag.responses {
            response.file = file.to_path_buf();
            self.responses.push(response);
        }
        for api in frag.apis {
            self.append_api(api, file);
        }

        if !self.has_metadata() {
            self.file = file.to_path_buf();
            self.span = frag.span;
        }
        m.field("lang", &mut self.lang, frag.lang, |v| v.range());
        m.field("logo", &mut self.logo, frag.logo, |v| v.range());
        m.field("version", &mut self.version, frag.version, |v| v.range());
        m.field("title", &mut self.title, frag.title, |v| v.span().range());
        m.field("description", &mut self.description, frag.description, |v| v.span().range());
        m.field("contact", &mut self.contact, frag.contact, |v| v.span().range());
        m.field("license", &mut self.license, frag.license, |v| v.span().range());

        if self.mimetypes.is_empty() {
            self.mimetypes = frag.mimetypes;
        } else if !frag.mimetypes.is_empty() && frag.mimetypes != self.mimetypes {
            let range = frag.mimetypes.first().map_or(frag.span.range(), Element::range);
            m.conflict("mimetype", range);
        }

        m.errors
    }
}

impl Element {
    fn range(&self) -> Range {
        self.span.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::position::Position;

    fn fragment(text: &str) -> Document {
        decode(Path::new("doc.rs"), text, Position::default(), false).unwrap()
    }

    const FIRST: &str = r#"<apidoc version="1.0.0"><title>A</title><mimetype>json</mimetype>
        <tag name="t1" title="one"/></apidoc>"#;

    #[test]
    fn first_declaration_wins() {
        let mut doc = Document::default();
        assert!(doc.merge(fragment(FIRST), Path::new("a.rs"), MetadataPolicy::default()).is_empty());
        assert!(doc.has_metadata());

        let second = r#"<apidoc version="2.0.0"><title>A</title><mimetype>json</mimetype></apidoc>"#;
        let errs = doc.merge(fragment(second), Path::new("b.rs"), MetadataPolicy::RejectConflicts);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].key, MessageKey::ConflictingDeclaration);
        assert_eq!(errs[0].field.as_deref(), Some("version"));
        assert_eq!(errs[0].file, Path::new("b.rs"));
        assert_eq!(doc.version.as_ref().unwrap().value.as_str(), "1.0.0");
        assert_eq!(doc.file, Path::new("a.rs"));
    }

    #[test]
    fn keep_first_is_silent() {
        let mut doc = Document::default();
        doc.merge(fragment(FIRST), Path::new("a.rs"), MetadataPolicy::KeepFirst);
        let second = r#"<apidoc version="2.0.0"><title>B</title><mimetype>xml</mimetype></apidoc>"#;
        assert!(doc.merge(fragment(second), Path::new("b.rs"), MetadataPolicy::KeepFirst).is_empty());
        assert_eq!(doc.title.as_ref().unwrap().text(), "A");
    }

    #[test]
    fn duplicate_tags_are_rejected_at_the_later_declaration() {
        let mut doc = Document::default();
        doc.merge(fragment(FIRST), Path::new("a.rs"), MetadataPolicy::KeepFirst);
        let again = r#"<apidoc version="1.0.0"><title>A</title><mimetype>json</mimetype>
            <tag name="t1" title="again"/></apidoc>"#;
        let errs = doc.merge(fragment(again), Path::new("b.rs"), MetadataPolicy::KeepFirst);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].key, MessageKey::DuplicateValue);
        assert_eq!(errs[0].range.start.line, 1);
        assert_eq!(doc.tags.len(), 1);
        assert_eq!(doc.tags[0].file, Path::new("a.rs"));
    }
}
