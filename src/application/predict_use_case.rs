// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Scores hand-written token sequences with a trained checkpoint.
// Input format is a comma-separated list of word ranks:
//   "1, 14, 22, 16, 43"

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::domain::review::Label;
use crate::error::PipelineError;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub probability: f32,
    pub label:       Label,
}

/// Parse "1,14,22" into ranks. Whitespace around entries is ignored;
/// an empty string is an empty review.
pub fn parse_tokens(text: &str) -> crate::error::Result<Vec<u32>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|t| {
            let t = t.trim();
            t.parse::<u32>()
                .map_err(|e| PipelineError::data(format!("'{t}' is not a word rank: {e}")))
        })
        .collect()
}

pub struct PredictUseCase {
    checkpoint_dir: String,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: String) -> Self {
        Self { checkpoint_dir }
    }

    pub fn execute<B: Backend>(&self, device: B::Device, reviews: &[String]) -> Result<Vec<Prediction>> {
        let sequences = reviews
            .iter()
            .map(|r| parse_tokens(r))
            .collect::<crate::error::Result<Vec<_>>>()?;

        let ckpt = CheckpointManager::open(&self.checkpoint_dir)?;
        let inferencer = Inferencer::<B>::from_checkpoint(&ckpt, device)
            .with_context(|| format!("Cannot restore the model from '{}'", self.checkpoint_dir))?;

        let probs = inferencer.predict(&sequences)?;
        Ok(probs
            .into_iter()
            .map(|p| Prediction { probability: p, label: Label::from_probability(p) })
            .collect())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_tokens("1,14, 22 ,3").unwrap(), vec![1, 14, 22, 3]);
        assert!(parse_tokens("   ").unwrap().is_empty());
        assert!(matches!(parse_tokens("1,x"), Err(PipelineError::Data(_))));
        assert!(parse_tokens("-4").is_err());
    }
}
