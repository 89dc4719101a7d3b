//! # autodoc-dbt
//!
//! Produces a model's column manifest by running
//! `dbt run-operation generate_model_yaml` from the dbt codegen package and
//! capturing its standard output. The manifest is regenerated on every call so
//! new columns are always picked up.

mod error;

pub use error::GenerationError;

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use autodoc_config::DbtConfig;
use tokio::process::Command;
use tokio::time::timeout;

/// Lines of captured output kept in [`GenerationError::Failed`].
const DIAGNOSTIC_LINES: usize = 40;

/// Something that can produce a model's manifest text.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn generate_manifest(&self, model: &str) -> Result<String, GenerationError>;
}

/// Runs the codegen macro through the dbt CLI.
#[derive(Debug, Clone)]
pub struct ManifestGenerator {
    program: String,
    project_dir: PathBuf,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl ManifestGenerator {
    #[must_use]
    pub fn new(config: &DbtConfig) -> Self {
        Self {
            program: config.program.clone(),
            project_dir: config.project_path(),
            extra_args: config.extra_args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Arguments passed to the program for `model`.
    #[must_use]
    pub fn command_args(&self, model: &str) -> Vec<String> {
        let macro_args = serde_json::json!({ "model_names": [model] }).to_string();
        let mut args = vec![
            "run-operation".to_string(),
            "generate_model_yaml".to_string(),
            "--args".to_string(),
            macro_args,
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl ManifestSource for ManifestGenerator {
    async fn generate_manifest(&self, model: &str) -> Result<String, GenerationError> {
        tracing::info!(model, program = %self.program, "generating manifest");

        let output = timeout(
            self.timeout,
            Command::new(&self.program)
                .args(self.command_args(model))
                .current_dir(&self.project_dir)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| GenerationError::TimedOut {
            model: model.to_string(),
            secs: self.timeout.as_secs(),
        })?
        .map_err(|source| GenerationError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"));
            return Err(GenerationError::Failed {
                model: model.to_string(),
                status,
                diagnostics: diagnostics(&output),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(GenerationError::EmptyManifest {
                model: model.to_string(),
            });
        }

        tracing::debug!(model, bytes = stdout.len(), "manifest captured");
        Ok(stdout)
    }
}

fn diagnostics(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        stderr
    };
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_LINES);
    lines[start..].join("\n")
}

/// The YAML document inside codegen output, without dbt's log preamble.
///
/// dbt prefixes log messages with a `HH:MM:SS` timestamp, including the first
/// line of the printed YAML. Everything before the first `version:` key is
/// dropped. Output with no `version:` key is returned trimmed.
#[must_use]
pub fn manifest_yaml(stdout: &str) -> &str {
    let mut offset = 0;
    for line in stdout.split_inclusive('\n') {
        if let Some(idx) = line.find("version:") {
            let prefix = &line[..idx];
            if prefix
                .chars()
                .all(|c| c.is_ascii_digit() || c == ':' || c.is_whitespace())
            {
                return stdout[offset + idx..].trim_end();
            }
        }
        offset += line.len();
    }
    stdout.trim()
}
