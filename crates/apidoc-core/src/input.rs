//! Source inputs: which files to read, in which language and encoding.

use crate::lang::{self, Language};
use encoding_rs::Encoding;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Problems with the input configuration. Nothing is parsed when one occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("no {lang} source files found under {}", .path.display())]
    NoFiles { lang: String, path: PathBuf },

    #[error("invalid document version: {0}")]
    InvalidVersion(String),

    #[error("invalid pattern {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// One root to collect sources from: a file, a directory or a glob pattern.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceInput {
    /// Language id, see [`lang::languages`].
    pub lang: String,
    pub path: PathBuf,
    #[serde(default)]
    pub recursive: bool,
    /// WHATWG encoding label; UTF-8 when absent.
    #[serde(default)]
    pub encoding: Option<String>,
    /// Extensions to collect instead of the language's own.
    #[serde(default)]
    pub exts: Vec<String>,
}

/// A [`SourceInput`] checked and expanded to concrete files.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub lang: &'static Language,
    pub encoding: Option<&'static Encoding>,
    pub files: Vec<PathBuf>,
}

impl SourceInput {
    pub fn new(lang: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            lang: lang.into(),
            path: path.into(),
            recursive: false,
            encoding: None,
            exts: Vec::new(),
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Look up the language and encoding and list the matching files.
    pub fn resolve(&self) -> Result<ResolvedInput, ConfigError> {
        let lang = lang::get(&self.lang).ok_or_else(|| ConfigError::UnsupportedLanguage(self.lang.clone()))?;
        let encoding = resolve_encoding(self.encoding.as_deref())?;

        let files = if self.path.is_file() {
            vec![self.path.clone()]
        } else if self.path.is_dir() {
            self.walk(lang)
        } else if is_pattern(&self.path) {
            self.expand_pattern()?
        } else {
            return Err(ConfigError::PathNotFound(self.path.clone()));
        };

        if files.is_empty() {
            return Err(ConfigError::NoFiles {
                lang: lang.id.to_string(),
                path: self.path.clone(),
            });
        }
        debug!(path = %self.path.display(), lang = lang.id, files = files.len(), "resolved input");
        Ok(ResolvedInput { lang, encoding, files })
    }

    fn wants(&self, lang: &Language, path: &Path) -> bool {
        if self.exts.is_empty() {
            return lang.matches_ext(path);
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.exts
            .iter()
            .any(|x| x.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    fn walk(&self, lang: &Language) -> Vec<PathBuf> {
        let depth = if self.recursive { usize::MAX } else { 1 };
        let mut files: Vec<PathBuf> = WalkDir::new(&self.path)
            .max_depth(depth)
            .into_iter()
            .flatten()
            .filter(|e| e.file_type().is_file() && self.wants(lang, e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    fn expand_pattern(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let pattern = self.path.to_string_lossy().into_owned();
        let paths = glob::glob(&pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        let mut files: Vec<PathBuf> = paths.flatten().filter(|p| p.is_file()).collect();
        files.sort();
        Ok(files)
    }
}

fn is_pattern(path: &Path) -> bool {
    path.to_string_lossy().contains(['*', '?', '['])
}

/// `None` stands for UTF-8, which needs no transcoding.
pub fn resolve_encoding(label: Option<&str>) -> Result<Option<&'static Encoding>, ConfigError> {
    let Some(label) = label else {
        return Ok(None);
    };
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(enc) if enc == encoding_rs::UTF_8 => Ok(None),
        Some(enc) => Ok(Some(enc)),
        None => Err(ConfigError::UnknownEncoding(label.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.rs"), "").unwrap();
        dir
    }

    #[test]
    fn directory_depth_follows_recursive_flag() {
        let dir = tree();
        let flat = SourceInput::new("rust", dir.path()).resolve().unwrap();
        assert_eq!(flat.files.len(), 1);
        let deep = SourceInput::new("rust", dir.path()).recursive(true).resolve().unwrap();
        assert_eq!(deep.files.len(), 2);
    }

    #[test]
    fn custom_extensions() {
        let dir = tree();
        let mut input = SourceInput::new("rust", dir.path());
        input.exts = vec![".txt".into()];
        let resolved = input.resolve().unwrap();
        assert!(resolved.files[0].ends_with("b.txt"));
    }

    #[test]
    fn glob_patterns() {
        let dir = tree();
        let pattern = dir.path().join("**/*.rs");
        let resolved = SourceInput::new("rust", pattern).resolve().unwrap();
        assert_eq!(resolved.files.len(), 2);
    }

    #[test]
    fn configuration_errors() {
        let dir = tree();
        assert!(matches!(
            SourceInput::new("cobol", dir.path()).resolve(),
            Err(ConfigError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            SourceInput::new("rust", dir.path().join("missing")).resolve(),
            Err(ConfigError::PathNotFound(_))
        ));
        assert!(matches!(
            SourceInput::new("rust", dir.path()).with_encoding("klingon").resolve(),
            Err(ConfigError::UnknownEncoding(_))
        ));
        assert!(matches!(
            SourceInput::new("python", dir.path()).resolve(),
            Err(ConfigError::NoFiles { .. })
        ));
    }

    #[test]
    fn encoding_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), None);
        assert_eq!(resolve_encoding(Some("utf8")).unwrap(), None);
        assert_eq!(resolve_encoding(Some("gbk")).unwrap(), Some(encoding_rs::GBK));
    }
}
