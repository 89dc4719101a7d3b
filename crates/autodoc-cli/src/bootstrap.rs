use std::path::Path;

use anyhow::Context;
use autodoc_config::AutodocConfig;

/// Load `.env` from the project root (or the current directory) and then
/// the layered configuration.
pub fn load_config(project_root: &Path) -> anyhow::Result<AutodocConfig> {
    load_project_dotenv(project_root)?;
    AutodocConfig::load_from(project_root).context("failed to load autodoc configuration")
}

fn load_project_dotenv(project_root: &Path) -> anyhow::Result<()> {
    let env_path = project_root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
        return Ok(());
    }

    dotenvy::dotenv().ok();
    Ok(())
}
