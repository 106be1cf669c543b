//! Core type definitions for kvstash
//!
//! The one fundamental type is [`Key`], the validated slash-delimited
//! path under which values are stored. Key folders follow the same
//! rules, so a single type covers both.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A slash-delimited path identifying a stored value or key folder.
///
/// Keys are restricted to `[A-Za-z0-9._:\-/]`, must be non-empty, and
/// may not contain a `/./` or `/../` segment.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    /// Create a new key, validating its characters and path segments
    pub fn new(key: impl Into<String>) -> Result<Self, KeyError> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self(key))
    }

    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix this key with an environment namespace.
    ///
    /// An empty environment means "global" and leaves the key untouched.
    #[must_use]
    pub fn scoped(&self, environment: &str) -> String {
        if environment.is_empty() {
            self.0.clone()
        } else {
            format!("{}/{}", environment, self.0)
        }
    }

    fn validate(key: &str) -> Result<(), KeyError> {
        if key.is_empty() {
            return Err(KeyError::Empty);
        }

        for c in key.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | ':' | '-' | '/') {
                return Err(KeyError::InvalidChar(c));
            }
        }

        // '.' and '_' etc. are fine inside a segment name; what is
        // rejected is a whole segment of '.' or '..'
        if key.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(KeyError::DotSegment);
        }

        Ok(())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Errors that can occur when creating a key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("key cannot be empty")]
    Empty,
    #[error("key contains unsupported character {0:?}; allowed set is [A-Za-z0-9._:-/]")]
    InvalidChar(char),
    #[error("key contains a disallowed '/./' or '/../' segment")]
    DotSegment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_valid() {
        assert!(Key::new("looks/like/a/file/path").is_ok());
        assert!(Key::new("app-name:password.auth").is_ok());
        assert!(Key::new("a").is_ok());
        assert!(Key::new("dotted.name/under_score").is_ok());
    }

    #[test]
    fn test_key_empty() {
        assert_eq!(Key::new(""), Err(KeyError::Empty));
    }

    #[test]
    fn test_key_invalid_chars() {
        assert_eq!(
            Key::new("${special}/chars"),
            Err(KeyError::InvalidChar('$'))
        );
        assert_eq!(Key::new("has space"), Err(KeyError::InvalidChar(' ')));
        assert_eq!(Key::new("uni\u{e9}"), Err(KeyError::InvalidChar('\u{e9}')));
    }

    #[test]
    fn test_key_dot_segments() {
        assert_eq!(Key::new("looks/like/an/./path"), Err(KeyError::DotSegment));
        assert_eq!(Key::new("looks/like/../path"), Err(KeyError::DotSegment));
        assert_eq!(Key::new(".."), Err(KeyError::DotSegment));
        // dots inside a segment name are fine
        assert!(Key::new("a/.hidden/b").is_ok());
        assert!(Key::new("a/b.c.d").is_ok());
    }

    #[test]
    fn test_key_scoped() {
        let key = Key::new("app/setting").unwrap();
        assert_eq!(key.scoped("prod"), "prod/app/setting");
        assert_eq!(key.scoped(""), "app/setting");
    }
}
