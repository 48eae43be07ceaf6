//! Scalar converters: the text form of attribute values and element content.

use crate::message::MessageKey;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;

/// A value that lives in an attribute or in an element's text.
pub trait Scalar: Sized + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Convert from markup text. The error is the message to report at the
    /// value's range.
    fn parse(raw: &str) -> Result<Self, MessageKey>;

    /// Text form written by the encoder.
    fn format(&self) -> String;

    /// Zero values of optional fields are left out when encoding.
    fn is_zero(&self) -> bool {
        false
    }
}

impl Scalar for String {
    fn parse(raw: &str) -> Result<Self, MessageKey> {
        Ok(raw.to_string())
    }

    fn format(&self) -> String {
        self.clone()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Boolean spellings accepted: `1 t T TRUE true True 0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl Scalar for bool {
    fn parse(raw: &str) -> Result<Self, MessageKey> {
        parse_bool(raw.trim()).ok_or(MessageKey::InvalidFormat)
    }

    fn format(&self) -> String {
        self.to_string()
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl Scalar for i64 {
    fn parse(raw: &str) -> Result<Self, MessageKey> {
        raw.trim().parse().map_err(|_| MessageKey::InvalidFormat)
    }

    fn format(&self) -> String {
        self.to_string()
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl Scalar for DateTime<FixedOffset> {
    fn parse(raw: &str) -> Result<Self, MessageKey> {
        DateTime::parse_from_rfc3339(raw.trim()).map_err(|_| MessageKey::InvalidFormat)
    }

    fn format(&self) -> String {
        self.to_rfc3339()
    }
}

/// Semantic version string, validated on decode and kept as written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(v: &str) -> Result<Self, MessageKey> {
        semver::Version::parse(v).map_err(|_| MessageKey::InvalidFormat)?;
        Ok(Version(v.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.0).ok()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Scalar for Version {
    fn parse(raw: &str) -> Result<Self, MessageKey> {
        Version::new(raw.trim())
    }

    fn format(&self) -> String {
        self.0.clone()
    }
}

/// HTTP response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Status(pub u16);

impl Scalar for Status {
    fn parse(raw: &str) -> Result<Self, MessageKey> {
        let code: u16 = raw.trim().parse().map_err(|_| MessageKey::InvalidFormat)?;
        if (100..600).contains(&code) {
            Ok(Status(code))
        } else {
            Err(MessageKey::InvalidValue)
        }
    }

    fn format(&self) -> String {
        self.0.to_string()
    }
}

/// Declares a keyword enum: parsing is exact, formatting writes the keyword.
macro_rules! keyword_scalar {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Scalar for $name {
            fn parse(raw: &str) -> Result<Self, MessageKey> {
                let raw = raw.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == raw)
                    .ok_or(MessageKey::InvalidValue)
            }

            fn format(&self) -> String {
                self.as_str().to_string()
            }
        }
    };
}

keyword_scalar! {
    /// HTTP request method.
    Method {
        Get => "GET",
        Post => "POST",
        Put => "PUT",
        Patch => "PATCH",
        Delete => "DELETE",
        Options => "OPTIONS",
        Head => "HEAD",
    }
}

keyword_scalar! {
    /// Primitive type of a parameter or request body.
    Type {
        None => "none",
        Bool => "bool",
        Number => "number",
        String => "string",
        Object => "object",
    }
}

keyword_scalar! {
    RichtextType {
        Html => "html",
        Markdown => "markdown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_spellings() {
        assert_eq!(bool::parse("True"), Ok(true));
        assert_eq!(bool::parse("0"), Ok(false));
        assert_eq!(bool::parse("yes"), Err(MessageKey::InvalidFormat));
    }

    #[test]
    fn keywords_are_exact() {
        assert_eq!(Method::parse("GET"), Ok(Method::Get));
        assert_eq!(Method::parse("get"), Err(MessageKey::InvalidValue));
        assert_eq!(Type::parse(" object "), Ok(Type::Object));
        assert_eq!(Type::Number.format(), "number");
    }

    #[test]
    fn version_is_validated_but_kept_verbatim() {
        assert_eq!(Version::parse("1.2.3-beta.1").map(|v| v.format()), Ok("1.2.3-beta.1".into()));
        assert_eq!(Version::parse("1.2"), Err(MessageKey::InvalidFormat));
    }

    #[test]
    fn status_range() {
        assert_eq!(Status::parse("404"), Ok(Status(404)));
        assert_eq!(Status::parse("99"), Err(MessageKey::InvalidValue));
        assert_eq!(Status::parse("ok"), Err(MessageKey::InvalidFormat));
    }

    #[test]
    fn dates_are_rfc3339() {
        let d = <DateTime<FixedOffset> as Scalar>::parse("2024-05-01T08:30:00+08:00").unwrap();
        assert_eq!(<DateTime<FixedOffset> as Scalar>::parse(&Scalar::format(&d)), Ok(d));
        assert!(<DateTime<FixedOffset> as Scalar>::parse("yesterday").is_err());
    }
}
