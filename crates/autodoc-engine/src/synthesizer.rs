//! Column and model descriptions from the completion service.

use std::collections::HashSet;

use autodoc_core::blocks::{self, DocBlock};
use autodoc_core::Identifier;
use autodoc_llm::{Completion, LlmError};

use crate::prompts;

/// Expected opening of every model summary.
pub const SUMMARY_PREFIX: &str = "This model";

pub struct Synthesizer<'a, C> {
    completion: &'a C,
    describe_instruction: String,
}

impl<'a, C: Completion> Synthesizer<'a, C> {
    pub fn new(completion: &'a C, domain: &str) -> Self {
        Self {
            completion,
            describe_instruction: prompts::describe_identifiers(domain),
        }
    }

    /// Docs blocks for `ids`, one per identifier, in the order requested.
    ///
    /// An empty list returns an empty string without a completion call.
    /// Blocks the service returns for names that were not requested, repeated
    /// blocks and unterminated blocks are discarded; requested names without
    /// a usable block are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns the service's [`LlmError`] unchanged.
    pub async fn describe_identifiers(&self, ids: &[Identifier]) -> Result<String, LlmError> {
        if ids.is_empty() {
            return Ok(String::new());
        }

        let payload = ids
            .iter()
            .map(Identifier::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        let response = self
            .completion
            .complete(&self.describe_instruction, &payload)
            .await?;

        let accepted = select_blocks(ids, blocks::parse(&response));
        if accepted.len() < ids.len() {
            let missing: Vec<&str> = ids
                .iter()
                .map(Identifier::as_str)
                .filter(|id| !accepted.iter().any(|b| b.name == *id))
                .collect();
            tracing::warn!(?missing, "no usable description returned");
        }

        tracing::info!(described = accepted.len(), "column descriptions generated");
        Ok(blocks::render_all(&accepted))
    }

    /// A one-paragraph summary of the model SQL in `source`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::EmptyResponse`] when the service answers with
    /// nothing usable, or the service's error unchanged.
    pub async fn describe_entity(&self, source: &str) -> Result<String, LlmError> {
        let response = self
            .completion
            .complete(prompts::DESCRIBE_ENTITY, source)
            .await?;

        let summary = single_paragraph(&response);
        if summary.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        if !summary.starts_with(SUMMARY_PREFIX) {
            tracing::warn!(%summary, "model summary does not start with {SUMMARY_PREFIX:?}");
        }
        Ok(summary)
    }
}

/// Well-formed blocks for requested names, first occurrence only, in request order.
fn select_blocks(ids: &[Identifier], returned: Vec<DocBlock>) -> Vec<DocBlock> {
    let requested: HashSet<&str> = ids.iter().map(Identifier::as_str).collect();
    let mut by_name = Vec::with_capacity(ids.len());
    let mut seen = HashSet::new();

    for block in returned {
        if !block.closed || block.body.trim().is_empty() {
            continue;
        }
        if !requested.contains(block.name.as_str()) {
            tracing::warn!(name = %block.name, "discarding block for unrequested column");
            continue;
        }
        if seen.insert(block.name.clone()) {
            by_name.push(block);
        }
    }

    ids.iter()
        .filter_map(|id| by_name.iter().find(|b| b.name == id.as_str()).cloned())
        .collect()
}

fn single_paragraph(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
