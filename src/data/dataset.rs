use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::domain::review::{Label, LabeledReview};
use crate::error::{PipelineError, Result};

/// Normalised, validated reviews ready for batching.
///
/// Every review has exactly `seq_len` tokens, all below `vocab_size`.
/// The samples sit behind an `Arc`: cloning the dataset for a data
/// loader shares them and nothing can mutate them afterwards.
#[derive(Debug, Clone)]
pub struct ReviewDataset {
    samples: Arc<Vec<LabeledReview>>,
}

impl ReviewDataset {
    pub fn new(samples: Vec<LabeledReview>, seq_len: usize, vocab_size: usize) -> Result<Self> {
        for (i, s) in samples.iter().enumerate() {
            if s.tokens.len() != seq_len {
                return Err(PipelineError::data(format!(
                    "review {i} has {} tokens, expected {seq_len}",
                    s.tokens.len()
                )));
            }
            s.check_vocab(vocab_size)
                .map_err(|e| PipelineError::data(format!("review {i}: {e}")))?;
        }
        Ok(Self { samples: Arc::new(samples) })
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn samples(&self) -> &[LabeledReview] { &self.samples }

    pub fn labels(&self) -> Vec<Label> {
        self.samples.iter().map(|s| s.label).collect()
    }
}

impl Dataset<LabeledReview> for ReviewDataset {
    fn get(&self, index: usize) -> Option<LabeledReview> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
