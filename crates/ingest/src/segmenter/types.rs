//! Segmenter configuration.

/// Token budget and overlap for [`segment`](super::segment).
///
/// `overlap` must be smaller than `chunk_size`; the pipeline enforces this
/// through `ChunkingConfig::validate` before any text is segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum tokens per chunk (default: 1000).
    pub chunk_size: usize,
    /// Tokens carried over from the previous chunk (default: 100).
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
        }
    }
}

impl From<&mcqgen_core::config::ChunkingConfig> for ChunkConfig {
    fn from(c: &mcqgen_core::config::ChunkingConfig) -> Self {
        Self {
            chunk_size: c.chunk_size,
            overlap: c.overlap,
        }
    }
}
