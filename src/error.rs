use thiserror::Error;

/// Errors the dispatcher reports back to the read loop.
///
/// Resource failures of individual commands travel as [`anyhow::Error`] with context
/// instead; these variants cover the cases where nothing was executed at all. Argument
/// count mismatches are not here: the builtin prints its own usage line.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Neither a builtin nor an executable on `PATH` has this name.
    #[error("Command not found: {0}")]
    NotFound(String),

    /// More than one `|`, or a `|` with nothing on one side.
    #[error("only two-stage pipelines are supported")]
    UnsupportedPipeline,
}
