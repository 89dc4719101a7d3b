use std::path::{Path, PathBuf};

use autodoc_config::AutodocConfig;

/// Resolved configuration and paths shared by every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AutodocConfig,
    pub project_root: PathBuf,
    pub store_path: PathBuf,
}

impl AppContext {
    /// `store_override` is resolved against the project root unless absolute.
    pub fn init(
        project_root: PathBuf,
        config: AutodocConfig,
        store_override: Option<&str>,
    ) -> anyhow::Result<Self> {
        let store_path = match store_override {
            Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
            Some(path) => project_root.join(path),
            None => config.dbt.docs_store_path(),
        };

        if store_path.is_dir() {
            anyhow::bail!(
                "documentation store {} is a directory, expected a file",
                store_path.display()
            );
        }

        tracing::debug!(
            project = %project_root.display(),
            store = %store_path.display(),
            "context initialized"
        );

        Ok(Self {
            config,
            project_root,
            store_path,
        })
    }
}
