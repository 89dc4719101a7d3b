use std::path::PathBuf;

use autodoc_dbt::GenerationError;
use autodoc_llm::LlmError;
use thiserror::Error;

/// Errors from a model's documentation run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The model's `.sql` file does not exist.
    #[error("transformation source not found: {}", .0.display())]
    MissingSource(PathBuf),

    /// The model directory does not exist or is not a directory.
    #[error("model directory not found: {}", .0.display())]
    MissingModelDir(PathBuf),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Service(#[from] LlmError),

    /// Metadata YAML is well-formed but not a dbt properties file.
    #[error("invalid metadata: {0}")]
    Metadata(String),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
