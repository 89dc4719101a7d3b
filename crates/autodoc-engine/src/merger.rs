//! Append-only merge into the shared documentation store.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use autodoc_core::blocks::{self, BLOCK_SEPARATOR, Diagnostics, Repair};

use crate::error::EngineError;
use crate::fs;

/// Append `new` to `store`.
///
/// Blank `new` text leaves the store untouched (borrowed). An empty store
/// becomes `new` itself; otherwise the two are joined by a blank line.
#[must_use]
pub fn merge<'a>(store: &'a str, new: &str) -> Cow<'a, str> {
    if new.trim().is_empty() {
        return Cow::Borrowed(store);
    }
    if store.is_empty() {
        return Cow::Owned(new.to_string());
    }
    Cow::Owned(format!("{store}{BLOCK_SEPARATOR}{new}"))
}

/// The documentation store file and its current contents.
#[derive(Debug, Clone)]
pub struct DocumentationStore {
    path: PathBuf,
    text: String,
}

impl DocumentationStore {
    /// Load the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let text = fs::read_optional(&path).await?.unwrap_or_default();
        Ok(Self { path, text })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Append `new` and persist. Returns whether the file was written.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the write fails; the in-memory text is
    /// left unchanged in that case.
    pub async fn merge(&mut self, new: &str) -> Result<bool, EngineError> {
        let merged = match merge(&self.text, new) {
            Cow::Borrowed(_) => return Ok(false),
            Cow::Owned(merged) => merged,
        };
        fs::write_atomic(&self.path, &merged).await?;
        tracing::info!(path = %self.path.display(), bytes = merged.len(), "documentation store updated");
        self.text = merged;
        Ok(true)
    }

    #[must_use]
    pub fn diagnose(&self) -> Diagnostics {
        blocks::diagnose(&self.text)
    }

    /// Run the repair pass, writing the result unless `check_only` is set or
    /// nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the write fails.
    pub async fn repair(&mut self, check_only: bool) -> Result<Repair, EngineError> {
        let repair = blocks::repair(&self.text);
        if repair.changed() && !check_only {
            fs::write_atomic(&self.path, &repair.text).await?;
            tracing::info!(
                path = %self.path.display(),
                closed = repair.closed.len(),
                dropped = repair.dropped.len(),
                "documentation store repaired"
            );
            self.text.clone_from(&repair.text);
        }
        Ok(repair)
    }
}
