use thiserror::Error;

/// Errors from running the codegen command.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("codegen for model '{model}' exited with {status}: {diagnostics}")]
    Failed {
        model: String,
        status: String,
        /// Tail of the captured stderr, or stdout when stderr is empty.
        diagnostics: String,
    },

    #[error("codegen for model '{model}' timed out after {secs}s")]
    TimedOut { model: String, secs: u64 },

    #[error("codegen for model '{model}' produced no output")]
    EmptyManifest { model: String },
}
