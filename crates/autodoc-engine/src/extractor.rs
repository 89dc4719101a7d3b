//! Identifier extraction from the documentation store and from manifests.

use autodoc_config::ExtractionMode;
use autodoc_core::identifier::dedupe;
use autodoc_core::{Identifier, blocks};
use autodoc_llm::Completion;

use crate::error::EngineError;
use crate::{metadata, prompts};

/// What kind of text identifiers are pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    DocumentationStore,
    Manifest,
}

impl SourceKind {
    const fn instruction(self) -> &'static str {
        match self {
            Self::DocumentationStore => prompts::STORE_EXTRACTION,
            Self::Manifest => prompts::MANIFEST_EXTRACTION,
        }
    }
}

/// Lists identifiers through the completion service or a structural scan.
pub struct Extractor<'a, C> {
    completion: &'a C,
    mode: ExtractionMode,
}

impl<'a, C: Completion> Extractor<'a, C> {
    pub const fn new(completion: &'a C, mode: ExtractionMode) -> Self {
        Self { completion, mode }
    }

    /// Ordered, distinct identifiers found in `text`.
    ///
    /// Blank text yields an empty list without contacting the service.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Service`] if the completion call fails, and a
    /// YAML or metadata error when a manifest cannot be scanned structurally.
    pub async fn extract_identifiers(
        &self,
        text: &str,
        kind: SourceKind,
    ) -> Result<Vec<Identifier>, EngineError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let ids = match self.mode {
            ExtractionMode::Model => {
                let response = self.completion.complete(kind.instruction(), text).await?;
                parse_identifier_list(&response)
            }
            ExtractionMode::Structural => {
                let names = match kind {
                    SourceKind::DocumentationStore => blocks::block_names(text),
                    SourceKind::Manifest => metadata::manifest_columns(text)?,
                };
                valid_identifiers(names.iter().map(String::as_str))
            }
        };

        tracing::debug!(?kind, count = ids.len(), "identifiers extracted");
        Ok(ids)
    }
}

/// Parse a comma-separated response into identifiers.
///
/// Newlines count as separators too, surrounding quotes and backticks are
/// stripped, and `NONE` means an empty list. Elements that are not plausible
/// identifiers are dropped with a warning.
#[must_use]
pub fn parse_identifier_list(response: &str) -> Vec<Identifier> {
    let response = response.trim();
    if response.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    valid_identifiers(
        response
            .split([',', '\n'])
            .map(|item| item.trim().trim_matches(['`', '"', '\'']).trim())
            .filter(|item| !item.is_empty()),
    )
}

fn valid_identifiers<'s>(names: impl Iterator<Item = &'s str>) -> Vec<Identifier> {
    dedupe(names.filter_map(|name| match Identifier::new(name) {
        Ok(id) => Some(id),
        Err(error) => {
            tracing::warn!(%error, "discarding extracted identifier");
            None
        }
    }))
}
