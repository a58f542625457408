//! Greedy sentence packing.

use mcqgen_core::Chunk;
use tracing::{debug, info};

use super::helpers::{clean_text, overlap_tail, split_sentences};
use super::types::ChunkConfig;
use crate::tokenizer::Tokenizer;

/// Segment raw extracted text into overlapping, token-bounded chunks.
///
/// A sentence is appended to the running chunk unless doing so would push
/// it past `chunk_size` tokens, in which case the running chunk is emitted
/// and the next one starts with its overlap tail followed by the sentence.
/// A sentence that alone exceeds the budget still forms its own chunk; it is
/// never split. Empty or whitespace-only input yields no chunks.
pub fn segment(raw_text: &str, tokenizer: &dyn Tokenizer, config: &ChunkConfig) -> Vec<Chunk> {
    let cleaned = clean_text(raw_text);
    let sentences = split_sentences(&cleaned);

    info!(
        chunk_size = config.chunk_size,
        overlap = config.overlap,
        "Creating chunks from {} sentences",
        sentences.len()
    );

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;
    let mut start_sentence = 0usize;

    for (idx, sentence) in sentences.iter().enumerate() {
        let sentence_tokens = tokenizer.count(sentence);

        if current_tokens + sentence_tokens > config.chunk_size && !current.is_empty() {
            let closed = std::mem::take(&mut current);
            let tail = overlap_tail(tokenizer, &closed, config.overlap);
            chunks.push(make_chunk(tokenizer, chunks.len(), closed, start_sentence));
            start_sentence = idx;

            if tail.is_empty() {
                current = sentence.clone();
                current_tokens = sentence_tokens;
            } else {
                current = format!("{tail} {sentence}");
                current_tokens = tokenizer.count(&current);
            }
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_tokens += sentence_tokens;
        }
    }

    if !current.trim().is_empty() {
        chunks.push(make_chunk(tokenizer, chunks.len(), current, start_sentence));
    }

    info!("Created {} chunks", chunks.len());
    for chunk in &chunks {
        debug!("Chunk {}: {} tokens", chunk.id, chunk.token_count);
    }

    chunks
}

fn make_chunk(tokenizer: &dyn Tokenizer, id: usize, text: String, start_sentence: usize) -> Chunk {
    let text = text.trim().to_string();
    let token_count = tokenizer.count(&text);
    Chunk {
        id,
        text,
        token_count,
        start_sentence,
    }
}
