use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Document the models in a directory, or one named model.
    Run(RunArgs),
    /// Close unterminated blocks and drop duplicates in the documentation store.
    Repair(RepairArgs),
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Directory holding the model `.sql` files, relative to the project root.
    pub model_dir: String,
    /// Only document this model (file stem of its `.sql` file).
    pub model: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct RepairArgs {
    /// Report problems without rewriting the store; exits 1 if any are found.
    #[arg(long)]
    pub check: bool,
}
