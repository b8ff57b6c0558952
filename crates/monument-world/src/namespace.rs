//! Namespace identifiers.
//!
//! A namespace names one independent simulation instance and, 1:1, the
//! store file that backs it. The identifier is validated once at parse
//! time; nothing downstream ever reassembles a path from raw user input.

use std::fmt;

/// Maximum length of a namespace identifier, in bytes.
const MAX_LEN: usize = 64;

/// A validated namespace identifier.
///
/// Matches `^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$`. Construct via
/// [`Namespace::parse`]; there is no way to obtain one that fails the
/// pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

/// A namespace identifier failed the validation pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid namespace identifier: {0:?}")]
pub struct InvalidNamespace(pub String);

impl Namespace {
    /// Parse and validate a namespace identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidNamespace`] if `raw` is empty, longer than
    /// [`MAX_LEN`], starts with anything but an ASCII alphanumeric, or
    /// contains a byte outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidNamespace> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > MAX_LEN {
            return Err(InvalidNamespace(raw));
        }
        let mut chars = raw.chars();
        let first = chars.next().expect("non-empty checked above");
        if !first.is_ascii_alphanumeric() {
            return Err(InvalidNamespace(raw));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(InvalidNamespace(raw));
        }
        Ok(Self(raw))
    }

    /// The validated identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The store file name for this namespace (`{namespace}.db`).
    #[must_use]
    pub fn store_file_name(&self) -> String {
        format!("{}.db", self.0)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
