//! Spaced random sampling of chunks.
//!
//! Picks which chunks become questions so that they are spread across the
//! document instead of clustered in one region. A minimum index gap between
//! chosen chunks starts at `min_gap` and relaxes by one (never below one)
//! whenever no remaining candidate satisfies it.

use mcqgen_core::config::SelectionConfig;
use mcqgen_core::Chunk;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Default starting gap.
pub const DEFAULT_MIN_GAP: usize = 3;

/// Indices picked by [`ChunkSelector::select_indices`], in the order they were
/// chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub indices: Vec<usize>,
    /// Gap in force when sampling stopped. `None` when every chunk was
    /// returned without sampling.
    pub min_gap: Option<usize>,
}

pub struct ChunkSelector<R: Rng = StdRng> {
    rng: R,
    min_gap: usize,
}

impl ChunkSelector<StdRng> {
    /// Reproducible selector.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        let selector = match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        };
        selector.with_min_gap(config.min_gap)
    }
}

impl<R: Rng> ChunkSelector<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            min_gap: DEFAULT_MIN_GAP,
        }
    }

    pub fn with_min_gap(mut self, min_gap: usize) -> Self {
        self.min_gap = min_gap.max(1);
        self
    }

    /// Choose up to `wanted` of `total` indices.
    ///
    /// When `total <= wanted` every index is returned in order and the gap
    /// rule is not applied.
    pub fn select_indices(&mut self, total: usize, wanted: usize) -> Selection {
        if total <= wanted {
            return Selection {
                indices: (0..total).collect(),
                min_gap: None,
            };
        }

        let mut gap = self.min_gap;
        let mut chosen: Vec<usize> = Vec::with_capacity(wanted);
        let mut used = vec![false; total];

        while chosen.len() < wanted && chosen.len() < total {
            let available: Vec<usize> = (0..total)
                .filter(|&i| !used[i] && chosen.iter().all(|&c| i.abs_diff(c) >= gap))
                .collect();

            if available.is_empty() {
                // At gap 1 every unused index qualifies, so this cannot spin.
                gap = gap.saturating_sub(1).max(1);
                debug!(gap, "No candidates at current gap, relaxing");
                continue;
            }

            let pick = available[self.rng.gen_range(0..available.len())];
            used[pick] = true;
            chosen.push(pick);
        }

        debug!(?chosen, gap, "Selected chunk indices");
        Selection {
            indices: chosen,
            min_gap: Some(gap),
        }
    }

    /// Choose up to `wanted` chunks, returned in selection order.
    pub fn select(&mut self, chunks: &[Chunk], wanted: usize) -> Vec<Chunk> {
        let selection = self.select_indices(chunks.len(), wanted);
        selection
            .indices
            .into_iter()
            .map(|i| chunks[i].clone())
            .collect()
    }
}
