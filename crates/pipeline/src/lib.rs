//! End-to-end question generation for batches of documents.

pub mod error;
pub mod request;
pub mod service;

pub use error::PipelineError;
pub use request::{validate_files, BatchRequest, InputFile};
pub use service::{ChunkPreview, McqService, ModelStatus};
