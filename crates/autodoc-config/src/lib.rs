//! # autodoc-config
//!
//! Layered configuration loading for autodoc using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`AUTODOC_*` prefix, `__` as separator)
//! 2. The plain variables `MODEL`, `ORG_ID`, `PROJ_ID`, `OPENAI_API_KEY`
//! 3. Project-level `autodoc.toml` in the dbt project directory
//! 4. User-level `~/.config/autodoc/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `AUTODOC_LLM__MODEL` -> `llm.model`, `AUTODOC_DBT__PROJECT_DIR`
//! -> `dbt.project_dir`, etc. The `__` (double underscore) separates nested
//! config sections.
//!
//! # Usage
//!
//! ```no_run
//! use autodoc_config::AutodocConfig;
//!
//! let config = AutodocConfig::load_with_dotenv().expect("config");
//! if let Err(error) = config.llm.validate() {
//!     eprintln!("{error}");
//! }
//! ```

mod dbt;
mod error;
mod general;
mod llm;

pub use dbt::DbtConfig;
pub use error::ConfigError;
pub use general::{ExtractionMode, GeneralConfig};
pub use llm::LlmConfig;

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::{Uncased, UncasedStr},
};
use serde::{Deserialize, Serialize};

/// Name of the project-local config file.
pub const PROJECT_CONFIG_FILE: &str = "autodoc.toml";

/// Plain environment variables and the keys they fill.
const PLAIN_ENV_KEYS: [(&str, &str); 4] = [
    ("MODEL", "llm.model"),
    ("ORG_ID", "llm.organization"),
    ("PROJ_ID", "llm.project"),
    ("OPENAI_API_KEY", "llm.api_key"),
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AutodocConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub dbt: DbtConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl AutodocConfig {
    /// Load configuration using the current directory as project root.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with `project_root/autodoc.toml` as the project layer.
    ///
    /// `dbt.project_dir` defaults to `project_root` unless a source sets it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed.
    pub fn load_from(project_root: &Path) -> Result<Self, ConfigError> {
        Self::figment_for(project_root)
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain for the current directory.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_for(Path::new("."))
    }

    /// Build the figment provider chain for a project root.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment_for(project_root: &Path) -> Figment {
        let defaults = Self {
            dbt: DbtConfig {
                project_dir: project_root.to_string_lossy().into_owned(),
                ..DbtConfig::default()
            },
            ..Self::default()
        };
        let mut figment = Figment::from(Serialized::defaults(defaults));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = project_root.join(PROJECT_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Plain variables used by existing deployments
        figment = figment.merge(plain_env());

        // Layer 4: Prefixed environment variables (highest priority)
        figment.merge(Env::prefixed("AUTODOC_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("autodoc").join("config.toml"))
    }
}

fn plain_env() -> Env {
    let names = PLAIN_ENV_KEYS.map(|(name, _)| name);
    Env::raw().only(&names).map(plain_env_key)
}

fn plain_env_key(key: &UncasedStr) -> Uncased<'_> {
    PLAIN_ENV_KEYS
        .iter()
        .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
        .map_or_else(|| key.as_str().into(), |(_, path)| (*path).into())
}
