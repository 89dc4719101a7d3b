use anyhow::Context;
use autodoc_dbt::ManifestGenerator;
use autodoc_engine::{DocumentationStore, Pipeline, discover_models};
use autodoc_llm::CompletionClient;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::BatchProgress;

/// Handle `autodoc run`.
pub async fn handle(args: &RunArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let model_dir = ctx.config.dbt.model_dir(&args.model_dir);
    let models = match &args.model {
        Some(model) => vec![model.clone()],
        None => discover_models(&model_dir).await?,
    };
    if models.is_empty() {
        tracing::warn!(dir = %model_dir.display(), "no .sql models found");
    }
    tracing::info!(
        project = %ctx.project_root.display(),
        store = %ctx.store_path.display(),
        models = models.len(),
        "starting run"
    );

    let completion =
        CompletionClient::new(&ctx.config.llm).context("failed to build completion client")?;
    tracing::debug!(model = completion.model(), "completion client ready");
    let pipeline = Pipeline::new(
        completion,
        ManifestGenerator::new(&ctx.config.dbt),
        &ctx.config.general,
    );

    let mut store = DocumentationStore::open(&ctx.store_path).await?;
    let progress = BatchProgress::new(models.len());
    let report = pipeline
        .run_batch(&model_dir, &models, &mut store, |step| progress.observe(step))
        .await;
    progress.finish(&report);

    output(&report, flags.format)?;

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} models failed",
            report.failed.len(),
            report.total()
        );
    }
    Ok(())
}
