//! Pipeline error type. Malformed fields never reach here; they degrade to "absent".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("history window must hold at least one event (got {0})")]
    InvalidHistoryLength(usize),

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("cannot collate an empty example list")]
    EmptyBatch,

    #[error("example {index} has {actions} history actions but {found} {field} entries")]
    RaggedExample {
        index: usize,
        field: &'static str,
        actions: usize,
        found: usize,
    },

    #[error("no rows survived filtering")]
    NoRows,

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
