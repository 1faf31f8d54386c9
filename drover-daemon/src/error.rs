//! Error types for drover-daemon.

use thiserror::Error;

use drover_core::EngineError;
use drover_resolver::ResolveError;

/// Error surface of the run driver. Any of these aborts the whole run, not
/// just the current iteration.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("run task join failure: {0}")]
    Join(String),
}
