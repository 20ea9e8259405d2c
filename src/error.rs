// ============================================================
// Pipeline Errors
// ============================================================
// Every library layer (domain, data, ml, infra) reports failures
// through PipelineError. The application and CLI layers wrap it
// in anyhow with context.
//
//   Configuration — bad sizes or stage widths, found before any
//                   tensor is created
//   Data          — a review or label that breaks the data model
//   Numerical     — the loss stopped being a finite number
//
// Nothing is retried: the first error aborts the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid data: {0}")]
    Data(String),

    #[error("Loss diverged at epoch {epoch}, batch {batch}: {loss}")]
    Numerical { epoch: usize, batch: usize, loss: f64 },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        PipelineError::Configuration(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        PipelineError::Data(msg.into())
    }
}
