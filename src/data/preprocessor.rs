// ============================================================
// Layer 4 — Sequence Preprocessor
// ============================================================
// Brings every review to the same length L so reviews can be
// stacked into one [batch, L] tensor.
//
// Policy (applied per review):
//   len > L  → keep the LAST L tokens (drop the oldest)
//   len < L  → prepend (L - len) padding tokens (0)
//   len == L → unchanged
//
// Example with L = 4:
//   [1, 2, 3]       → [0, 1, 2, 3]
//   [4, 5]          → [0, 0, 4, 5]
//   [1, 2, 3, 4, 5] → [2, 3, 4, 5]
//
// Reference: Rust Book §8 (Vectors), §13 (Iterators)

use crate::domain::review::{LabeledReview, PAD_TOKEN};
use crate::error::{PipelineError, Result};

/// Truncate or left-pad `sequence` to exactly `len` tokens.
pub fn normalize(sequence: &[u32], len: usize) -> Vec<u32> {
    if sequence.len() >= len {
        return sequence[sequence.len() - len..].to_vec();
    }

    let mut out = Vec::with_capacity(len);
    out.resize(len - sequence.len(), PAD_TOKEN);
    out.extend_from_slice(sequence);
    out
}

pub struct SequencePreprocessor {
    seq_len: usize,
}

impl SequencePreprocessor {
    pub fn new(seq_len: usize) -> Result<Self> {
        if seq_len == 0 {
            return Err(PipelineError::config("sequence length must be positive"));
        }
        Ok(Self { seq_len })
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn normalize(&self, sequence: &[u32]) -> Vec<u32> {
        normalize(sequence, self.seq_len)
    }

    /// Normalise every review, keeping its label attached.
    pub fn normalize_all(&self, reviews: &[LabeledReview]) -> Vec<LabeledReview> {
        let truncated = reviews.iter().filter(|r| r.tokens.len() > self.seq_len).count();
        if truncated > 0 {
            tracing::debug!(
                "Truncated {} of {} reviews to their last {} tokens",
                truncated,
                reviews.len(),
                self.seq_len
            );
        }

        reviews
            .iter()
            .map(|r| LabeledReview::new(self.normalize(&r.tokens), r.label))
            .collect()
    }
}
