use mcqgen_core::ConfigError;
use mcqgen_ingest::{ExtractionError, TokenizerError};
use mcqgen_llm::LlmError;
use mcqgen_storage::StoreError;
use thiserror::Error;

/// Failures that reject a whole request or stop the service from starting.
///
/// Per-document and per-chunk failures are reported inside the
/// [`BatchReport`](mcqgen_core::BatchReport) instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No files provided")]
    NoFiles,

    #[error("Maximum {max} files allowed, got {count}")]
    TooManyFiles { count: usize, max: usize },

    #[error("File {0} is not an allowed type")]
    UnsupportedFileType(String),

    #[error("File {filename} is {size} bytes, limit is {max}")]
    FileTooLarge { filename: String, size: u64, max: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Model error: {0}")]
    Llm(#[from] LlmError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl PipelineError {
    /// Caller supplied bad input, as opposed to a service-side failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PipelineError::NoFiles
                | PipelineError::TooManyFiles { .. }
                | PipelineError::UnsupportedFileType(_)
                | PipelineError::FileTooLarge { .. }
                | PipelineError::Config(_)
        )
    }
}
