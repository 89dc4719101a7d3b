use std::fmt::Write as _;

use autodoc_core::responses::{BatchReport, RepairResponse, SummaryOutcome};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Plain-text rendering used by `--format text`.
pub trait TextReport {
    fn text(&self) -> String;
}

/// Render a response to a string in the requested format.
pub fn render<T: Serialize + TextReport>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(value.text()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a response in the requested format.
pub fn output<T: Serialize + TextReport>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

impl TextReport for BatchReport {
    fn text(&self) -> String {
        let mut out = String::new();
        for model in &self.succeeded {
            let summary = match model.summary {
                SummaryOutcome::Preserved => "kept",
                SummaryOutcome::Generated => "generated",
            };
            let _ = writeln!(
                out,
                "ok    {}: {} new, {}/{} referenced, summary {summary}{}",
                model.model,
                model.described.len(),
                model.references,
                model.manifest_columns,
                if model.metadata_created { ", created metadata" } else { "" },
            );
        }
        for failure in &self.failed {
            let _ = writeln!(out, "FAIL  {}: {}", failure.model, failure.error);
        }
        let elapsed = (self.finished_at - self.started_at).num_seconds();
        let _ = write!(
            out,
            "{} succeeded, {} failed in {elapsed}s",
            self.succeeded.len(),
            self.failed.len()
        );
        out
    }
}

impl TextReport for RepairResponse {
    fn text(&self) -> String {
        let mut out = format!("{}: {} blocks", self.store_path, self.blocks);
        if self.closed.is_empty() && self.dropped.is_empty() {
            out.push_str(", clean");
            return out;
        }
        if !self.closed.is_empty() {
            let _ = write!(out, "\nunterminated: {}", self.closed.join(", "));
        }
        if !self.dropped.is_empty() {
            let _ = write!(out, "\nduplicates: {}", self.dropped.join(", "));
        }
        out.push_str(if self.written {
            "\nrepaired"
        } else {
            "\nnot written"
        });
        out
    }
}
