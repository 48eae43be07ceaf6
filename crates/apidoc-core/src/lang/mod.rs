//! Comment recognizer set, one rule-set per supported source language.

mod lexer;
mod shape;

pub use lexer::Lexer;
pub use shape::{Consumed, Shape};

use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// A supported source language and how its comments look.
#[derive(Debug)]
pub struct Language {
    pub id: &'static str,
    pub name: &'static str,
    pub exts: &'static [&'static str],
    /// Tried in order at every cursor position; the first match wins.
    pub blocks: &'static [Shape],
}

impl Language {
    pub fn matches_ext(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.exts.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }
}

// -- Shared rule-sets ---------------------------------------------------------

const DQ: Shape = Shape::string("\"", "\"", Some('\\'));
const SQ: Shape = Shape::string("'", "'", Some('\\'));
const BACKTICK: Shape = Shape::string("`", "`", Some('\\'));
const SLASH_LINE: Shape = Shape::line("//", "/!");
const STAR_BLOCK: Shape = Shape::block("/*", "*/", "*");
const STAR_NESTED: Shape = Shape::nested("/*", "*/", "*!");
const HASH_LINE: Shape = Shape::line("#", "#");

const C_STYLE: &[Shape] = &[DQ, SQ, SLASH_LINE, STAR_BLOCK];
const JS_STYLE: &[Shape] = &[DQ, SQ, BACKTICK, SLASH_LINE, STAR_BLOCK];
const NESTED_C_STYLE: &[Shape] = &[DQ, SLASH_LINE, STAR_NESTED];

static LANGUAGES: &[Language] = &[
    Language { id: "c", name: "C", exts: &["h", "c"], blocks: C_STYLE },
    Language {
        id: "c++",
        name: "C++",
        exts: &["h", "hh", "hpp", "hxx", "cpp", "cc", "cxx"],
        blocks: C_STYLE,
    },
    Language { id: "c#", name: "C#", exts: &["cs"], blocks: &[DQ, SLASH_LINE, STAR_BLOCK] },
    Language {
        id: "d",
        name: "D",
        exts: &["d"],
        blocks: &[DQ, BACKTICK, SLASH_LINE, STAR_BLOCK, Shape::nested("/+", "+/", "+")],
    },
    Language { id: "dart", name: "Dart", exts: &["dart"], blocks: &[DQ, SQ, SLASH_LINE, STAR_NESTED] },
    Language { id: "erlang", name: "Erlang", exts: &["erl", "hrl"], blocks: &[DQ, Shape::line("%", "%")] },
    Language {
        id: "go",
        name: "Go",
        exts: &["go"],
        blocks: &[DQ, Shape::string("`", "`", None), SQ, SLASH_LINE, STAR_BLOCK],
    },
    Language { id: "groovy", name: "Groovy", exts: &["groovy"], blocks: C_STYLE },
    Language {
        id: "haskell",
        name: "Haskell",
        exts: &["hs"],
        blocks: &[DQ, Shape::nested("{-", "-}", "-"), Shape::line("--", "-")],
    },
    Language { id: "java", name: "Java", exts: &["java"], blocks: C_STYLE },
    Language { id: "javascript", name: "JavaScript", exts: &["js", "mjs", "cjs", "jsx"], blocks: JS_STYLE },
    Language { id: "kotlin", name: "Kotlin", exts: &["kt", "kts"], blocks: NESTED_C_STYLE },
    Language {
        id: "lisp",
        name: "Lisp",
        exts: &["lisp", "lsp", "el"],
        blocks: &[DQ, Shape::nested("#|", "|#", "|"), Shape::line(";", ";")],
    },
    Language {
        id: "lua",
        name: "Lua",
        exts: &["lua"],
        blocks: &[DQ, SQ, Shape::block("--[[", "]]", "-"), Shape::line("--", "-")],
    },
    Language {
        id: "nim",
        name: "Nim",
        exts: &["nim"],
        blocks: &[DQ, Shape::nested("#[", "]#", "#"), HASH_LINE],
    },
    Language {
        id: "pascal",
        name: "Pascal",
        exts: &["pas", "pp"],
        blocks: &[
            Shape::string("'", "'", None),
            SLASH_LINE,
            Shape::block("(*", "*)", "*"),
            Shape::block("{", "}", ""),
        ],
    },
    Language {
        id: "perl",
        name: "Perl",
        exts: &["pl", "pm"],
        blocks: &[DQ, SQ, Shape::line_anchored("=pod", "=cut", ""), HASH_LINE],
    },
    Language {
        id: "php",
        name: "PHP",
        exts: &["php"],
        blocks: &[DQ, SQ, SLASH_LINE, Shape::line("#", ""), STAR_BLOCK],
    },
    Language {
        id: "python",
        name: "Python",
        exts: &["py"],
        blocks: &[
            Shape::block("\"\"\"", "\"\"\"", ""),
            Shape::block("'''", "'''", ""),
            DQ,
            SQ,
            HASH_LINE,
        ],
    },
    Language {
        id: "ruby",
        name: "Ruby",
        exts: &["rb"],
        blocks: &[DQ, SQ, Shape::line_anchored("=begin", "=end", ""), HASH_LINE],
    },
    Language { id: "rust", name: "Rust", exts: &["rs"], blocks: NESTED_C_STYLE },
    Language { id: "scala", name: "Scala", exts: &["scala"], blocks: NESTED_C_STYLE },
    Language { id: "shell", name: "Shell", exts: &["sh", "bash", "bats"], blocks: &[DQ, SQ, HASH_LINE] },
    Language { id: "swift", name: "Swift", exts: &["swift"], blocks: NESTED_C_STYLE },
    Language { id: "typescript", name: "TypeScript", exts: &["ts", "tsx"], blocks: JS_STYLE },
    Language { id: "zig", name: "Zig", exts: &["zig"], blocks: &[DQ, SLASH_LINE] },
];

/// Every supported language, in id order.
pub fn languages() -> &'static [Language] {
    LANGUAGES
}

/// Look a language up by id (case-insensitive).
pub fn get(id: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.id.eq_ignore_ascii_case(id))
}

/// First language claiming the file's extension.
pub fn by_path(path: &Path) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.matches_ext(path))
}

/// Pick the language whose extensions are most common under `dir`.
///
/// Ties go to the language listed first.
pub fn detect(dir: &Path, recursive: bool) -> Option<&'static Language> {
    let depth = if recursive { usize::MAX } else { 1 };
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for entry in WalkDir::new(dir).max_depth(depth).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        for lang in LANGUAGES.iter().filter(|l| l.matches_ext(entry.path())) {
            *counts.entry(lang.id).or_default() += 1;
        }
    }
    debug!(dir = %dir.display(), ?counts, "language detection");

    let mut best: Option<(&'static Language, usize)> = None;
    for lang in LANGUAGES {
        let n = counts.get(lang.id).copied().unwrap_or(0);
        if n > 0 && best.map_or(true, |(_, m)| n > m) {
            best = Some((lang, n));
        }
    }
    best.map(|(lang, _)| lang)
}
