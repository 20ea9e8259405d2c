// ============================================================
// Layer 4 — Review Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<LabeledReview>
// into tensors.
//
// How batching works here:
//   Input:  N reviews, each already normalised to length L
//   Output: ReviewBatch with
//             tokens  [N, L]  (Int)
//             labels  [N]     (Int, 0 or 1)
//
//   Tokens are flattened row by row and reshaped:
//   [r1_t1, ..., r1_tL, r2_t1, ..., rN_tL] → [N, L]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::review::LabeledReview;

// ─── ReviewBatch ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ReviewBatch<B: Backend> {
    /// Word ranks — shape: [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Ground truth sentiment — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── ReviewBatcher ────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on it.
#[derive(Clone, Debug)]
pub struct ReviewBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ReviewBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<LabeledReview, ReviewBatch<B>> for ReviewBatcher<B> {
    fn batch(&self, items: Vec<LabeledReview>) -> ReviewBatch<B> {
        let batch_size = items.len();
        // All reviews have the same length (pre-normalised)
        let seq_len = items.first().map(|r| r.tokens.len()).unwrap_or(0);

        let token_flat: Vec<i64> = items
            .iter()
            .flat_map(|r| r.tokens.iter().map(|&t| t as i64))
            .collect();

        let labels: Vec<i64> = items
            .iter()
            .map(|r| r.label.as_u8() as i64)
            .collect();

        let tokens = Tensor::<B, 2, Int>::from_data(
            TensorData::new(token_flat, [batch_size, seq_len]),
            &self.device,
        );

        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        ReviewBatch { tokens, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::review::Label;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let batcher = ReviewBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![
            LabeledReview::new(vec![0, 1, 2], Label::Positive),
            LabeledReview::new(vec![3, 4, 5], Label::Negative),
        ]);

        assert_eq!(batch.tokens.dims(), [2, 3]);
        assert_eq!(batch.labels.dims(), [2]);

        let tokens: Vec<i64> = batch.tokens.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(tokens, vec![0, 1, 2, 3, 4, 5]);

        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![1, 0]);
    }
}
