use thiserror::Error;

/// Document-level failures, recorded on the document's
/// [`DocumentReport`](crate::DocumentReport) without aborting the batch.
///
/// Chunk-level failures never surface here: they are recorded on the
/// chunk's [`GenerationResult`](crate::GenerationResult) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum McqError {
    /// The document yielded no usable text.
    #[error("{reason}")]
    Extraction { filename: String, reason: String },

    /// Results were generated but could not be persisted.
    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("chunk size must be > 0")]
    ZeroChunkSize,

    #[error("overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },

    #[error("max files must be > 0")]
    ZeroMaxFiles,

    #[error("unknown {field}: '{value}'")]
    UnknownValue { field: &'static str, value: String },
}
