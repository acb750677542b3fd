//! Error types shared across the generation pipeline.

use tokio::task::JoinError;

/// Failures that abort a pipeline run.
///
/// Per-subtopic problems (failed completions, missing lesson content, disk
/// errors) never show up here: they are absorbed by fallback content or logged.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Topic structure generation failed for '{subject}': {source}")]
    Structure {
        subject: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Invalid topic structure: {0}")]
    InvalidStructure(String),
    #[error("Concurrency gate was closed")]
    GateClosed,
    #[error("Generation task failed: {0}")]
    Task(#[from] JoinError),
}

/// All attempts for one unit of work failed.
///
/// Returned as a value inside [`crate::retry::CallOutcome`] so that callers
/// decide on fallback content explicitly.
#[derive(Debug, thiserror::Error)]
#[error("Exhausted {attempts} attempts: {last_error}")]
pub struct ExhaustedRetries {
    pub attempts: u32,
    pub last_error: anyhow::Error,
}
