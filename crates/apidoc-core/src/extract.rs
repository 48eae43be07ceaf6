//! Block extractor: turns a source file into a sequence of comment blocks.

use crate::lang::{Language, Lexer};
use crate::message::{ErrorKind, MessageKey, SyntaxError};
use crate::position::{Position, Range};
use encoding_rs::{DecoderResult, Encoding};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One comment region of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub file: Arc<Path>,
    /// 0-based line the comment starts on.
    pub line: u32,
    pub start: Position,
    /// The comment exactly as written.
    pub raw: String,
    /// `raw` with comment delimiters and line prefixes blanked out. Same
    /// byte length and line layout as `raw`.
    pub data: String,
}

/// Lazy, source-ordered iterator over the comment blocks of one file.
///
/// Stops for good at the first unterminated comment: nothing after it is
/// reported, and the unterminated comment itself is dropped silently. An
/// unclosed string literal only hides the rest of its own line.
pub struct Extractor<'a> {
    file: Arc<Path>,
    lexer: Lexer<'a>,
    lang: &'static Language,
    done: bool,
}

impl<'a> Extractor<'a> {
    pub fn new(file: Arc<Path>, text: &'a str, lang: &'static Language) -> Self {
        Self {
            file,
            lexer: Lexer::new(text),
            lang,
            done: false,
        }
    }
}

impl Iterator for Extractor<'_> {
    type Item = CommentBlock;

    fn next(&mut self) -> Option<CommentBlock> {
        while !self.done {
            if self.lexer.at_eof() {
                self.done = true;
                break;
            }

            let Some(shape) = self.lang.blocks.iter().find(|b| b.begins_at(&self.lexer)) else {
                self.lexer.bump();
                continue;
            };

            let start = self.lexer.position();
            let Some(consumed) = shape.consume_until_end(&mut self.lexer, self.lang.blocks) else {
                debug!(file = %self.file.display(), line = start.line + 1, "unterminated block dropped");
                self.done = true;
                break;
            };
            if !shape.is_comment() {
                continue;
            }

            return Some(CommentBlock {
                file: Arc::clone(&self.file),
                line: start.line,
                start,
                raw: consumed.raw.to_string(),
                data: consumed.data,
            });
        }
        None
    }
}

/// Convenience constructor mirroring [`Extractor::new`].
pub fn extract<'a>(file: Arc<Path>, text: &'a str, lang: &'static Language) -> Extractor<'a> {
    Extractor::new(file, text, lang)
}

/// A file's decoded text.
///
/// When the bytes are malformed for the declared encoding, `text` holds
/// everything decoded before the bad sequence and `error` points at it.
#[derive(Debug)]
pub struct SourceText {
    pub text: String,
    pub error: Option<SyntaxError>,
}

/// Read `path` and decode it with `encoding` (UTF-8 when `None`).
///
/// An unreadable file is an error; a malformed byte sequence is not, see
/// [`SourceText`].
pub fn read_source(path: &Path, encoding: Option<&'static Encoding>) -> Result<SourceText, SyntaxError> {
    let bytes = fs::read(path).map_err(|err| {
        debug!(file = %path.display(), %err, "read failed");
        SyntaxError::new(ErrorKind::Extract, path, Range::default(), MessageKey::ReadFailed)
    })?;
    Ok(decode_bytes(path, &bytes, encoding))
}

/// Decode raw bytes, keeping the valid prefix when they are malformed.
pub fn decode_bytes(path: &Path, bytes: &[u8], encoding: Option<&'static Encoding>) -> SourceText {
    let (text, malformed) = match encoding {
        None => match std::str::from_utf8(bytes) {
            Ok(s) => (s.to_string(), false),
            Err(e) => {
                let valid = String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned();
                (valid, true)
            }
        },
        Some(enc) => {
            let mut decoder = enc.new_decoder_without_bom_handling();
            let capacity = decoder
                .max_utf8_buffer_length_without_replacement(bytes.len())
                .unwrap_or(bytes.len() * 3);
            let mut out = String::with_capacity(capacity);
            let (result, _read) = decoder.decode_to_string_without_replacement(bytes, &mut out, true);
            (out, !matches!(result, DecoderResult::InputEmpty))
        }
    };

    let error = malformed.then(|| {
        let mut at = Position::default();
        at.advance_str(&text);
        SyntaxError::new(ErrorKind::Extract, path, Range::new(at, at), MessageKey::InvalidEncoding)
    });
    SourceText { text, error }
}
