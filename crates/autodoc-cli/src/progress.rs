use std::cell::Cell;

use autodoc_core::responses::BatchReport;
use autodoc_engine::Progress as Step;
use indicatif::{ProgressBar, ProgressStyle};

use crate::ui;

const TEMPLATE: &str = "{wide_bar:.cyan/blue} {pos}/{len} {msg}";

/// Batch progress on stderr, fed by pipeline events.
///
/// Everything is a no-op when progress display is disabled.
pub struct BatchProgress {
    bar: Option<ProgressBar>,
    failed: Cell<usize>,
}

impl BatchProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        let bar = ui::prefs().progress.then(|| {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::with_template(TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        });
        Self {
            bar,
            failed: Cell::new(0),
        }
    }

    pub fn observe(&self, step: Step<'_>) {
        if let Step::Finished {
            succeeded: false, ..
        } = step
        {
            self.failed.set(self.failed.get() + 1);
        }
        let Some(bar) = &self.bar else {
            return;
        };
        match step {
            Step::Started { model, .. } => bar.set_message(step_message(model, self.failed.get())),
            Step::Finished { .. } => bar.inc(1),
        }
    }

    pub fn finish(&self, report: &BatchReport) {
        let Some(bar) = &self.bar else {
            return;
        };
        let message = summary_message(report.succeeded.len(), report.failed.len());
        if report.is_success() {
            bar.finish_with_message(message);
        } else {
            bar.abandon_with_message(message);
        }
    }
}

fn step_message(model: &str, failed: usize) -> String {
    if failed == 0 {
        model.to_string()
    } else {
        format!("{model} ({failed} failed so far)")
    }
}

fn summary_message(succeeded: usize, failed: usize) -> String {
    match failed {
        0 => format!("{succeeded} documented"),
        _ => format!("{succeeded} documented, {failed} failed"),
    }
}
