//! Diagnostics, the message catalog and the reporting seam.
//!
//! The core never prints and never decides exit codes. Every problem found
//! while extracting, decoding or sanitizing becomes a [`SyntaxError`] that is
//! handed to a [`Reporter`]. Human-readable text comes from a [`Catalog`]
//! that the caller builds once and passes to whatever renders the messages.

use crate::position::Range;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which pipeline stage produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unreadable file or undecodable bytes; halts that file only.
    Extract,
    /// Malformed markup or schema violation; halts that block only.
    Decode,
    /// Cross-reference or shape violation found after assembly.
    Sanitize,
}

/// Catalog key for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Required,
    InvalidFormat,
    InvalidValue,
    DuplicateValue,
    DuplicateElement,
    PathNotMatchParams,
    NotFound,
    NotFoundEndTag,
    MismatchedEndTag,
    UnknownElement,
    UnknownAttribute,
    UnexpectedText,
    InvalidMarkup,
    ConflictingDeclaration,
    ReadFailed,
    InvalidEncoding,
}

impl MessageKey {
    pub const ALL: &'static [MessageKey] = &[
        MessageKey::Required,
        MessageKey::InvalidFormat,
        MessageKey::InvalidValue,
        MessageKey::DuplicateValue,
        MessageKey::DuplicateElement,
        MessageKey::PathNotMatchParams,
        MessageKey::NotFound,
        MessageKey::NotFoundEndTag,
        MessageKey::MismatchedEndTag,
        MessageKey::UnknownElement,
        MessageKey::UnknownAttribute,
        MessageKey::UnexpectedText,
        MessageKey::InvalidMarkup,
        MessageKey::ConflictingDeclaration,
        MessageKey::ReadFailed,
        MessageKey::InvalidEncoding,
    ];
}

/// A positioned diagnostic.
///
/// `field` names the attribute or element the message is about (the declared
/// schema name), when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: ErrorKind,
    pub file: PathBuf,
    pub range: Range,
    pub key: MessageKey,
    pub field: Option<String>,
}

impl SyntaxError {
    pub fn new(kind: ErrorKind, file: impl Into<PathBuf>, range: Range, key: MessageKey) -> Self {
        Self {
            kind,
            file: file.into(),
            range,
            key,
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn decode(file: &Path, range: Range, key: MessageKey) -> Self {
        Self::new(ErrorKind::Decode, file, range, key)
    }

    pub fn sanitize(file: &Path, range: Range, key: MessageKey) -> Self {
        Self::new(ErrorKind::Sanitize, file, range, key)
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Catalog::default().render(self))
    }
}

impl std::error::Error for SyntaxError {}

/// Receives every diagnostic produced by the core.
///
/// Called concurrently from extraction and decode workers; reporting never
/// aborts sibling work.
pub trait Reporter: Send + Sync {
    fn report(&self, err: SyntaxError);
}

impl<F> Reporter for F
where
    F: Fn(SyntaxError) + Send + Sync,
{
    fn report(&self, err: SyntaxError) {
        self(err)
    }
}

/// Reporter that keeps every error in memory.
#[derive(Debug, Default)]
pub struct Collector {
    errors: Mutex<Vec<SyntaxError>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Snapshot of the errors collected so far.
    pub fn errors(&self) -> Vec<SyntaxError> {
        self.errors.lock().clone()
    }

    pub fn into_errors(self) -> Vec<SyntaxError> {
        self.errors.into_inner()
    }
}

impl Reporter for Collector {
    fn report(&self, err: SyntaxError) {
        self.errors.lock().push(err);
    }
}

/// Supported message languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LocaleId {
    #[default]
    En,
    ZhHans,
}

impl LocaleId {
    pub const ALL: &'static [LocaleId] = &[LocaleId::En, LocaleId::ZhHans];

    pub fn tag(self) -> &'static str {
        match self {
            LocaleId::En => "en",
            LocaleId::ZhHans => "zh-Hans",
        }
    }
}

impl FromStr for LocaleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(LocaleId::En),
            // Most systems report zh-CN rather than zh-Hans.
            "zh-hans" | "zh-cn" | "zh-sg" | "zh" => Ok(LocaleId::ZhHans),
            _ => Err(format!("unsupported locale: {}", s)),
        }
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Localized message text, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Catalog {
    id: LocaleId,
    messages: HashMap<MessageKey, &'static str>,
    located_at: &'static str,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(LocaleId::En)
    }
}

impl Catalog {
    pub fn new(id: LocaleId) -> Self {
        let messages = MessageKey::ALL
            .iter()
            .map(|&key| (key, translate(id, key)))
            .collect();
        let located_at = match id {
            LocaleId::En => "at",
            LocaleId::ZhHans => "位于",
        };
        Self {
            id,
            messages,
            located_at,
        }
    }

    pub fn id(&self) -> LocaleId {
        self.id
    }

    pub fn text(&self, key: MessageKey) -> &str {
        self.messages.get(&key).copied().unwrap_or("")
    }

    /// `"<field>: <message> at <file>:<line>:<col>"`
    pub fn render(&self, err: &SyntaxError) -> String {
        let text = self.text(err.key);
        let body = match &err.field {
            Some(field) => format!("{}: {}", field, text),
            None => text.to_string(),
        };
        format!(
            "{} {} {}:{}",
            body,
            self.located_at,
            err.file.display(),
            err.range.start
        )
    }
}

fn translate(id: LocaleId, key: MessageKey) -> &'static str {
    use MessageKey::*;
    match id {
        LocaleId::En => match key {
            Required => "is required",
            InvalidFormat => "has an invalid format",
            InvalidValue => "has an invalid value",
            DuplicateValue => "duplicate value",
            DuplicateElement => "may only appear once",
            PathNotMatchParams => "path parameters do not match the declared params",
            NotFound => "refers to an undeclared name",
            NotFoundEndTag => "end tag not found",
            MismatchedEndTag => "end tag does not match its start tag",
            UnknownElement => "unknown element",
            UnknownAttribute => "unknown attribute",
            UnexpectedText => "unexpected character data",
            InvalidMarkup => "malformed markup",
            ConflictingDeclaration => "conflicts with an earlier declaration",
            ReadFailed => "unable to read file",
            InvalidEncoding => "malformed byte sequence for the declared encoding",
        },
        LocaleId::ZhHans => match key {
            Required => "不能为空",
            InvalidFormat => "格式不正确",
            InvalidValue => "无效的值",
            DuplicateValue => "重复的值",
            DuplicateElement => "只能出现一次",
            PathNotMatchParams => "地址参数不匹配",
            NotFound => "未找到该值",
            NotFoundEndTag => "找不到结束符号",
            MismatchedEndTag => "结束标签与开始标签不匹配",
            UnknownElement => "未知的元素",
            UnknownAttribute => "未知的属性",
            UnexpectedText => "无效的字符数据",
            InvalidMarkup => "标记格式不正确",
            ConflictingDeclaration => "与之前的声明冲突",
            ReadFailed => "无法读取文件",
            InvalidEncoding => "与指定编码不符的字节序列",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn sample() -> SyntaxError {
        SyntaxError::decode(
            Path::new("src/main.rs"),
            Range::new(Position::new(2, 4, 30), Position::new(2, 9, 35)),
            MessageKey::Required,
        )
        .with_field("summary")
    }

    #[test]
    fn every_key_has_text_in_every_locale() {
        for &id in LocaleId::ALL {
            let catalog = Catalog::new(id);
            for &key in MessageKey::ALL {
                assert!(!catalog.text(key).is_empty(), "{id}: {key:?}");
            }
        }
    }

    #[test]
    fn renders_english_by_default() {
        assert_eq!(sample().to_string(), "summary: is required at src/main.rs:3:5");
    }

    #[test]
    fn renders_chinese() {
        let catalog = Catalog::new(LocaleId::ZhHans);
        assert_eq!(catalog.render(&sample()), "summary: 不能为空 位于 src/main.rs:3:5");
    }

    #[test]
    fn locale_aliases() {
        assert_eq!("zh-CN".parse::<LocaleId>(), Ok(LocaleId::ZhHans));
        assert_eq!("en".parse::<LocaleId>(), Ok(LocaleId::En));
        assert!("fr".parse::<LocaleId>().is_err());
    }

    #[test]
    fn collector_is_shared_across_threads() {
        let collector = Collector::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| collector.report(sample()));
            }
        });
        assert_eq!(collector.len(), 4);
    }
}
