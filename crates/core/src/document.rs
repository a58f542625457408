use serde::{Deserialize, Serialize};

/// Sequential, 0-based chunk identifier within one document.
pub type ChunkId = usize;

/// A token-bounded slice of cleaned document text.
///
/// `token_count` is the tokenizer's count for `text`, computed when the
/// segmenter emits the chunk. Chunks are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub token_count: usize,
    /// Index of the first sentence that starts inside this chunk (overlap
    /// text carried from the previous chunk is not counted).
    pub start_sentence: usize,
}

impl Chunk {
    /// First `max_chars` characters of the text, for log lines.
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.text, max_chars)
    }
}

/// Truncate to `max_chars` characters, appending `...` when something was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("short", 100), "short");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let text = "é".repeat(120);
        let p = preview(&text, 100);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 103);
    }
}
