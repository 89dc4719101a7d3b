//! Column identifiers and the set arithmetic the pipeline runs on them.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Identifiers longer than this are treated as model noise.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// A case-sensitive column name.
///
/// Construction trims surrounding whitespace and rejects anything that could
/// not appear as a column name inside a `{% docs %}` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Build an identifier from raw text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] when the trimmed text is empty,
    /// too long, or contains whitespace, quotes, braces, or commas.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CoreError> {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        let reason = if trimmed.is_empty() {
            Some("empty")
        } else if trimmed.len() > MAX_IDENTIFIER_LEN {
            Some("too long")
        } else if trimmed.chars().any(char::is_whitespace) {
            Some("contains whitespace")
        } else if trimmed
            .chars()
            .any(|c| matches!(c, '{' | '}' | '%' | '"' | '\'' | '`' | ','))
        {
            Some("contains template or quote characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoreError::InvalidIdentifier {
                raw: raw.to_string(),
                reason,
            }),
            None => Ok(Self(trimmed.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

/// Remove later repeats, keeping first-occurrence order.
#[must_use]
pub fn dedupe(ids: impl IntoIterator<Item = Identifier>) -> Vec<Identifier> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Identifiers in `manifest` that are not in `documented`, in manifest order.
#[must_use]
pub fn missing_from(manifest: &[Identifier], documented: &[Identifier]) -> Vec<Identifier> {
    let documented: HashSet<&str> = documented.iter().map(Identifier::as_str).collect();
    dedupe(
        manifest
            .iter()
            .filter(|id| !documented.contains(id.as_str()))
            .cloned(),
    )
}
