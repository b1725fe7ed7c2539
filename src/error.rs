use thiserror::Error;

/// Main error type for clsm-eval
#[derive(Error, Debug)]
pub enum EvalError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON artifacts (dataset, claims, checkpoint, predictions)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dataset content that violates the data model (labels, feature layout)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Checkpoint shape or content errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Forward pass failures for a batch
    #[error("Inference error: {0}")]
    Inference(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Run aborted after too many failed batches
    #[error("Too many failed batches: {failed} failed (limit {limit})")]
    TooManyFailures { failed: usize, limit: usize },
}

/// Convenient Result type using EvalError
pub type Result<T> = std::result::Result<T, EvalError>;
