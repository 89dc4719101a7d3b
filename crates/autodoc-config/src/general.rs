//! General application configuration.

use serde::{Deserialize, Serialize};

/// How identifiers are pulled out of the manifest and the documentation store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Ask the completion service for a comma-separated list.
    #[default]
    Model,
    /// Scan docs tags and manifest YAML directly.
    Structural,
}

fn default_domain() -> String {
    String::from("municipal finance, infrastructure, and terminology")
}

/// Wait this long for another run to release the documentation store.
const fn default_lock_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub extraction: ExtractionMode,

    /// Subject-matter expertise the column descriptions are written from.
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionMode::default(),
            domain: default_domain(),
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}
