// ============================================================
// Layer 4 — Synthetic Review Generator
// ============================================================
// Produces a deterministic, label-balanced corpus that an LSTM
// can actually learn. Used when no corpus directory is given,
// and throughout the tests.
//
// Every review mixes uniformly random ranks with "cue" ranks:
//   positive reviews over-sample band A = [1, 1 + w)
//   negative reviews over-sample band B = [1 + w, 1 + 2w)
// where w = K / 8.
//
// Same seed → same corpus. Train and test are drawn one after
// the other from a single StdRng.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::review::{DatasetSplit, Label, LabeledReview};
use crate::domain::traits::ReviewSource;
use crate::error::{PipelineError, Result};

/// Smallest vocabulary that leaves room for two cue bands.
pub const MIN_SYNTHETIC_VOCAB: usize = 8;

const CUE_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct SyntheticReviewSource {
    reviews_per_split: usize,
    min_len:           usize,
    max_len:           usize,
    seed:              u64,
}

impl SyntheticReviewSource {
    pub fn new(reviews_per_split: usize, min_len: usize, max_len: usize, seed: u64) -> Self {
        Self { reviews_per_split, min_len, max_len, seed }
    }

    fn generate(&self, rng: &mut StdRng, vocab_size: usize) -> Vec<LabeledReview> {
        let band = vocab_size / 8;
        (0..self.reviews_per_split)
            .map(|i| {
                let label = if i % 2 == 0 { Label::Positive } else { Label::Negative };
                let cue_start = match label {
                    Label::Positive => 1,
                    Label::Negative => 1 + band,
                };
                let len = rng.gen_range(self.min_len..=self.max_len);
                let tokens = (0..len)
                    .map(|_| {
                        if rng.gen_bool(CUE_PROBABILITY) {
                            rng.gen_range(cue_start..cue_start + band) as u32
                        } else {
                            rng.gen_range(1..vocab_size) as u32
                        }
                    })
                    .collect();
                LabeledReview::new(tokens, label)
            })
            .collect()
    }
}

impl ReviewSource for SyntheticReviewSource {
    fn load(&self, vocab_size: usize) -> Result<DatasetSplit> {
        if vocab_size < MIN_SYNTHETIC_VOCAB {
            return Err(PipelineError::config(format!(
                "synthetic reviews need a vocabulary of at least {MIN_SYNTHETIC_VOCAB}, got {vocab_size}"
            )));
        }
        if self.min_len == 0 || self.min_len > self.max_len {
            return Err(PipelineError::config(format!(
                "invalid synthetic review length range {}..={}",
                self.min_len, self.max_len
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let train = self.generate(&mut rng, vocab_size);
        let test  = self.generate(&mut rng, vocab_size);

        tracing::info!(
            "Generated {} synthetic reviews per split (seed {})",
            self.reviews_per_split,
            self.seed
        );
        Ok(DatasetSplit::new(train, test))
    }

    fn describe(&self) -> String {
        format!("synthetic:{}x2", self.reviews_per_split)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_sized_balanced_partitions() {
        let split = SyntheticReviewSource::new(20, 3, 9, 7).load(100).unwrap();
        assert_eq!(split.train.len(), 20);
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.positive_counts(), (10, 10));
    }

    #[test]
    fn test_tokens_within_vocabulary_and_lengths() {
        let split = SyntheticReviewSource::new(50, 2, 6, 1).load(16).unwrap();
        for r in split.train.iter().chain(split.test.iter()) {
            assert!(r.check_vocab(16).is_ok());
            assert!((2..=6).contains(&r.tokens.len()));
            assert!(r.tokens.iter().all(|&t| t != 0));
        }
    }

    #[test]
    fn test_same_seed_same_corpus() {
        let a = SyntheticReviewSource::new(10, 1, 5, 42).load(64).unwrap();
        let b = SyntheticReviewSource::new(10, 1, 5, 42).load(64).unwrap();
        let c = SyntheticReviewSource::new(10, 1, 5, 43).load(64).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
        assert_ne!(a.train, c.train);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            SyntheticReviewSource::new(4, 1, 3, 0).load(0),
            Err(PipelineError::Configuration(_))
        ));
        assert!(matches!(
            SyntheticReviewSource::new(4, 5, 3, 0).load(100),
            Err(PipelineError::Configuration(_))
        ));
    }
}
