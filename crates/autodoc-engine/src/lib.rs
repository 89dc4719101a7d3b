//! # autodoc-engine
//!
//! Keeps a dbt project's shared documentation store and per-model
//! properties files in step with freshly generated manifests.
//!
//! For each model the [`Pipeline`] regenerates the manifest, works out which
//! columns have no docs block yet, asks the completion service to describe
//! only those, appends the new blocks to the store, and points the model's
//! column descriptions at the store. A model summary is generated only when
//! the properties file has none.

pub mod error;
pub mod extractor;
mod fs;
pub mod merger;
pub mod metadata;
pub mod pipeline;
pub mod prompts;
pub mod synthesizer;

pub use error::EngineError;
pub use extractor::{Extractor, SourceKind};
pub use merger::{DocumentationStore, merge};
pub use metadata::MetadataFile;
pub use pipeline::{ModelPaths, Pipeline, Progress, discover_models};
pub use synthesizer::Synthesizer;
