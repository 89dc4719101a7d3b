use autodoc_core::responses::RepairResponse;
use autodoc_engine::DocumentationStore;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RepairArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `autodoc repair`.
pub async fn handle(args: &RepairArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut store = DocumentationStore::open(&ctx.store_path).await?;
    let blocks = store.diagnose().blocks;
    let repair = store.repair(args.check).await?;

    let response = RepairResponse {
        store_path: store.path().display().to_string(),
        blocks,
        written: repair.changed() && !args.check,
        closed: repair.closed,
        dropped: repair.dropped,
    };
    output(&response, flags.format)?;

    if args.check && !(response.closed.is_empty() && response.dropped.is_empty()) {
        anyhow::bail!("documentation store needs repair; run `autodoc repair`");
    }
    Ok(())
}
