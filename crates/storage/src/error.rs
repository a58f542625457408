use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCQ file not found: {0}")]
    NotFound(String),

    #[error("invalid record key: '{0}'")]
    InvalidKey(String),
}
