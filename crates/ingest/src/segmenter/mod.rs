//! Sentence-packing text segmenter.
//!
//! Cleans extracted text, splits it into sentences, and greedily packs the
//! sentences into chunks bounded by a token budget. Each new chunk is seeded
//! with the last `overlap` tokens of the chunk before it. Output is fully
//! deterministic for a given input, tokenizer and config.

mod helpers;
mod strategies;
mod types;

pub use helpers::{clean_text, split_sentences};
pub use strategies::segment;
pub use types::ChunkConfig;
