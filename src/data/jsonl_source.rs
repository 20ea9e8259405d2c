// ============================================================
// Layer 4 — JSONL Review Loader
// ============================================================
// Reads a pre-indexed review corpus from a directory:
//
//   <dir>/
//     train.jsonl
//     test.jsonl
//
// One review per line, already converted to word ranks:
//   {"tokens": [1, 14, 22, 16, 43, 530], "label": 1}
//
// Ranks at or above the vocabulary cap K are not part of the
// K-word representation. They are either dropped from the
// review or replaced by a chosen out-of-vocabulary rank.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::review::{DatasetSplit, LabeledReview};
use crate::domain::traits::ReviewSource;
use crate::error::{PipelineError, Result};

/// What happens to ranks `>= vocab_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfVocabulary {
    /// Remove the token from the review
    #[default]
    Drop,
    /// Replace the token with this rank (must itself be below the cap)
    Replace(u32),
}

pub struct JsonlReviewSource {
    dir:               PathBuf,
    out_of_vocabulary: OutOfVocabulary,
}

impl JsonlReviewSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), out_of_vocabulary: OutOfVocabulary::Drop }
    }

    pub fn with_out_of_vocabulary(mut self, policy: OutOfVocabulary) -> Self {
        self.out_of_vocabulary = policy;
        self
    }

    /// Parse one partition file and apply the vocabulary cap.
    fn load_partition(&self, path: &Path, vocab_size: usize) -> Result<Vec<LabeledReview>> {
        let file = File::open(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("cannot open '{}': {e}", path.display()))
        })?;

        let mut reviews = Vec::new();
        let mut capped  = 0usize;

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let mut review: LabeledReview = serde_json::from_str(&line).map_err(|e| {
                PipelineError::data(format!("{}:{}: {e}", path.display(), idx + 1))
            })?;

            let before = review.tokens.clone();
            review.tokens = self.apply_cap(&review.tokens, vocab_size);
            if review.tokens != before {
                capped += 1;
            }
            reviews.push(review);
        }

        tracing::debug!(
            "Loaded {} reviews from '{}' ({} touched by the vocabulary cap)",
            reviews.len(),
            path.display(),
            capped
        );
        Ok(reviews)
    }

    fn apply_cap(&self, tokens: &[u32], vocab_size: usize) -> Vec<u32> {
        let in_vocab = |t: u32| (t as usize) < vocab_size;
        match self.out_of_vocabulary {
            OutOfVocabulary::Drop => tokens.iter().copied().filter(|&t| in_vocab(t)).collect(),
            OutOfVocabulary::Replace(oov) => tokens
                .iter()
                .map(|&t| if in_vocab(t) { t } else { oov })
                .collect(),
        }
    }
}

impl ReviewSource for JsonlReviewSource {
    fn load(&self, vocab_size: usize) -> Result<DatasetSplit> {
        if vocab_size == 0 {
            return Err(PipelineError::config("vocabulary size must be positive"));
        }
        if let OutOfVocabulary::Replace(oov) = self.out_of_vocabulary {
            if oov as usize >= vocab_size {
                return Err(PipelineError::config(format!(
                    "out-of-vocabulary token {oov} must be below the vocabulary size {vocab_size}"
                )));
            }
        }

        let train = self.load_partition(&self.dir.join("train.jsonl"), vocab_size)?;
        let test  = self.load_partition(&self.dir.join("test.jsonl"), vocab_size)?;

        if train.len() != test.len() {
            tracing::warn!(
                "Partitions differ in size: {} train vs {} test",
                train.len(),
                test.len()
            );
        }

        tracing::info!(
            "Loaded {} train / {} test reviews from '{}'",
            train.len(),
            test.len(),
            self.dir.display()
        );
        Ok(DatasetSplit::new(train, test))
    }

    fn describe(&self) -> String {
        format!("jsonl:{}", self.dir.display())
    }
}
