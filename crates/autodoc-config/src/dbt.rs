//! dbt project and codegen invocation settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_project_dir() -> String {
    String::from(".")
}

fn default_program() -> String {
    String::from("dbt")
}

fn default_docs_path() -> String {
    String::from("docs/_docs.md")
}

const fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DbtConfig {
    /// Root of the dbt project (where `dbt_project.yml` lives).
    #[serde(default = "default_project_dir")]
    pub project_dir: String,

    /// Executable used for `run-operation`.
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments appended after the codegen arguments (e.g., `--target dev`).
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Timeout for a single codegen invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Shared documentation store, relative to `project_dir` unless absolute.
    #[serde(default = "default_docs_path")]
    pub docs_path: String,
}

impl Default for DbtConfig {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            program: default_program(),
            extra_args: Vec::new(),
            timeout_secs: default_timeout_secs(),
            docs_path: default_docs_path(),
        }
    }
}

impl DbtConfig {
    #[must_use]
    pub fn project_path(&self) -> PathBuf {
        PathBuf::from(&self.project_dir)
    }

    /// Resolved path of the documentation store.
    #[must_use]
    pub fn docs_store_path(&self) -> PathBuf {
        let docs = Path::new(&self.docs_path);
        if docs.is_absolute() {
            docs.to_path_buf()
        } else {
            self.project_path().join(docs)
        }
    }

    /// Resolve a model directory argument against the project root.
    #[must_use]
    pub fn model_dir(&self, dir: &str) -> PathBuf {
        let dir = Path::new(dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.project_path().join(dir)
        }
    }
}
