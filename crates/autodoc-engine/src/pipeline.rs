//! The per-model documentation sequence and the batch driver around it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use autodoc_config::{ExtractionMode, GeneralConfig};
use autodoc_core::identifier::{dedupe, missing_from};
use autodoc_core::responses::{BatchReport, ModelFailure, ModelReport, SummaryOutcome};
use autodoc_core::{Identifier, blocks};
use autodoc_dbt::{ManifestSource, manifest_yaml};
use autodoc_llm::Completion;
use chrono::Utc;

use crate::error::EngineError;
use crate::extractor::{Extractor, SourceKind};
use crate::fs;
use crate::merger::DocumentationStore;
use crate::metadata::MetadataFile;
use crate::synthesizer::Synthesizer;

const SOURCE_EXTENSION: &str = "sql";
const METADATA_EXTENSION: &str = "yml";

/// Files belonging to one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub model: String,
    pub source: PathBuf,
    pub metadata: PathBuf,
}

impl ModelPaths {
    #[must_use]
    pub fn new(dir: &Path, model: &str) -> Self {
        Self {
            model: model.to_string(),
            source: dir.join(format!("{model}.{SOURCE_EXTENSION}")),
            metadata: dir.join(format!("{model}.{METADATA_EXTENSION}")),
        }
    }
}

/// Model names for every `.sql` file directly inside `dir`, sorted.
///
/// # Errors
///
/// Returns [`EngineError::MissingModelDir`] if `dir` is not a directory and
/// [`EngineError::Io`] if it cannot be listed.
pub async fn discover_models(dir: &Path) -> Result<Vec<String>, EngineError> {
    if !tokio::fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) {
        return Err(EngineError::MissingModelDir(dir.to_path_buf()));
    }

    let mut entries = tokio::fs::read_dir(dir).await.map_err(EngineError::io(dir))?;
    let mut models = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(EngineError::io(dir))? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map_err(EngineError::io(&path))?
            .is_file();
        if is_file
            && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            models.push(stem.to_string());
        }
    }
    models.sort();
    Ok(models)
}

/// Batch progress notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    Started {
        model: &'a str,
        index: usize,
        total: usize,
    },
    Finished {
        model: &'a str,
        succeeded: bool,
    },
}

/// Documents models against one documentation store.
pub struct Pipeline<C, M> {
    completion: C,
    manifests: M,
    extraction: ExtractionMode,
    domain: String,
}

impl<C: Completion, M: ManifestSource> Pipeline<C, M> {
    pub fn new(completion: C, manifests: M, general: &GeneralConfig) -> Self {
        Self {
            completion,
            manifests,
            extraction: general.extraction,
            domain: general.domain.clone(),
        }
    }

    pub const fn completion(&self) -> &C {
        &self.completion
    }

    /// Document one model.
    ///
    /// Steps run in order and stop at the first error. Writes that already
    /// happened (store append, metadata creation) are kept.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingSource`] before any external call if
    /// the model's `.sql` file is missing, otherwise the first failing
    /// step's error.
    pub async fn run_model(
        &self,
        dir: &Path,
        model: &str,
        store: &mut DocumentationStore,
    ) -> Result<ModelReport, EngineError> {
        let paths = ModelPaths::new(dir, model);
        let source = fs::read_optional(&paths.source)
            .await?
            .ok_or_else(|| EngineError::MissingSource(paths.source.clone()))?;

        tracing::info!(model, "documenting model");
        let output = self.manifests.generate_manifest(model).await?;
        let manifest = manifest_yaml(&output);

        let extractor = Extractor::new(&self.completion, self.extraction);
        let documented = extractor
            .extract_identifiers(store.text(), SourceKind::DocumentationStore)
            .await?;
        let documented = present_in_store(documented, store.text());
        let columns = extractor
            .extract_identifiers(manifest, SourceKind::Manifest)
            .await?;
        let missing = missing_from(&columns, &documented);
        tracing::info!(
            model,
            columns = columns.len(),
            documented = documented.len(),
            missing = missing.len(),
            "identifiers compared"
        );

        let synthesizer = Synthesizer::new(&self.completion, &self.domain);
        let new_blocks = synthesizer.describe_identifiers(&missing).await?;
        store.merge(&new_blocks).await?;
        let described = blocks::block_names(&new_blocks);

        let mut metadata = MetadataFile::open_or_create(&paths.metadata, model, manifest).await?;
        if !metadata.created() {
            metadata.sync_columns(manifest).await?;
        }

        let references = dedupe(
            documented
                .into_iter()
                .chain(described.iter().filter_map(|name| Identifier::new(name).ok())),
        );
        let referenced = metadata.write_identifier_references(&references).await?;

        let summary = if metadata.has_summary()? {
            SummaryOutcome::Preserved
        } else {
            let text = synthesizer.describe_entity(&source).await?;
            metadata.write_entity_summary(&text).await?;
            SummaryOutcome::Generated
        };

        Ok(ModelReport {
            model: model.to_string(),
            metadata_path: paths.metadata.display().to_string(),
            metadata_created: metadata.created(),
            manifest_columns: columns.len(),
            described,
            references: referenced,
            summary,
        })
    }

    /// Document `models` in order, isolating failures.
    ///
    /// A failed model is recorded and the batch moves on to the next one.
    pub async fn run_batch(
        &self,
        dir: &Path,
        models: &[String],
        store: &mut DocumentationStore,
        mut on_progress: impl FnMut(Progress<'_>),
    ) -> BatchReport {
        let started_at = Utc::now();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for (index, model) in models.iter().enumerate() {
            on_progress(Progress::Started {
                model,
                index,
                total: models.len(),
            });
            let ok = match self.run_model(dir, model, store).await {
                Ok(report) => {
                    succeeded.push(report);
                    true
                }
                Err(error) => {
                    tracing::error!(model = %model, %error, "model failed");
                    failed.push(ModelFailure {
                        model: model.clone(),
                        error: error.to_string(),
                    });
                    false
                }
            };
            on_progress(Progress::Finished {
                model,
                succeeded: ok,
            });
        }

        BatchReport {
            started_at,
            finished_at: Utc::now(),
            succeeded,
            failed,
        }
    }
}

/// Keep only identifiers that have a block in the store.
fn present_in_store(ids: Vec<Identifier>, store: &str) -> Vec<Identifier> {
    let blocks: HashSet<String> = blocks::block_names(store).into_iter().collect();
    ids.into_iter()
        .filter(|id| {
            let present = blocks.contains(id.as_str());
            if !present {
                tracing::warn!(identifier = %id, "extracted name has no block in the store");
            }
            present
        })
        .collect()
}
