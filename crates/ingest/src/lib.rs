//! Document ingestion: text extraction, token counting, segmentation into
//! overlapping token-bounded chunks, and spaced selection of chunks for
//! question generation.

pub mod document;
pub mod segmenter;
pub mod selector;
pub mod tokenizer;

pub use document::{extract_file, extract_text, ExtractedDocument, ExtractionError};
pub use segmenter::{segment, ChunkConfig};
pub use selector::{ChunkSelector, Selection};
pub use tokenizer::{CharTokenizer, Cl100kTokenizer, Tokenizer, TokenizerError};
