//! Report types returned as JSON by `autodoc` commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to the model-level description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// An existing non-empty description was kept.
    Preserved,
    /// A description was generated and inserted.
    Generated,
}

/// Outcome of one model's documentation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReport {
    pub model: String,
    pub metadata_path: String,
    /// Whether the metadata file was created by this run.
    pub metadata_created: bool,
    /// Columns listed by the freshly generated manifest.
    pub manifest_columns: usize,
    /// Columns that received new blocks in the documentation store.
    pub described: Vec<String>,
    /// Columns whose description now references the documentation store.
    pub references: usize,
    pub summary: SummaryOutcome,
}

/// A model that failed, with the error kept as text for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFailure {
    pub model: String,
    pub error: String,
}

/// Response from `autodoc run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: Vec<ModelReport>,
    pub failed: Vec<ModelFailure>,
}

impl BatchReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Response from `autodoc repair`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairResponse {
    pub store_path: String,
    pub blocks: usize,
    pub closed: Vec<String>,
    pub dropped: Vec<String>,
    /// False for `--check` or when nothing needed repair.
    pub written: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&SummaryOutcome::Preserved).unwrap();
        assert_eq!(json, "\"preserved\"");
    }

    #[test]
    fn batch_report_success_tracks_failures() {
        let now = Utc::now();
        let mut report = BatchReport {
            started_at: now,
            finished_at: now,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        assert!(report.is_success());

        report.failed.push(ModelFailure {
            model: "stg_parcels".into(),
            error: "dbt exited with status 1".into(),
        });
        assert!(!report.is_success());
        assert_eq!(report.total(), 1);
    }
}
