use std::path::{Path, PathBuf};

use anyhow::Context;

/// Marker file at the root of every dbt project.
const PROJECT_MARKER: &str = "dbt_project.yml";

/// Walk upwards from `start` until a directory containing `dbt_project.yml` is found.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(PROJECT_MARKER).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// The explicit `--project` directory, else the nearest dbt project above the
/// current directory, else the current directory itself.
pub fn resolve_project_root(project_override: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(path) = project_override {
        let explicit = PathBuf::from(path);
        if explicit.is_dir() {
            return Ok(explicit);
        }
        anyhow::bail!(
            "invalid --project '{}': directory does not exist",
            explicit.display()
        );
    }

    let start = std::env::current_dir().context("failed to read current directory")?;
    Ok(find_project_root(&start).unwrap_or_else(|| {
        tracing::debug!("no {PROJECT_MARKER} found above the current directory");
        start
    }))
}
