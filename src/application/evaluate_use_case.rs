// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Reloads a trained checkpoint and scores the test partition
// of the data source it was trained on (or another directory
// with the same layout).

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::data::{dataset::ReviewDataset, preprocessor::SequencePreprocessor};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    evaluator::{evaluate, Evaluation},
    inferencer::Inferencer,
};

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    /// Replaces the data directory recorded at training time
    data_dir:       Option<String>,
    /// Defaults to the training batch size
    batch_size:     Option<usize>,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: String, data_dir: Option<String>, batch_size: Option<usize>) -> Self {
        Self { checkpoint_dir, data_dir, batch_size }
    }

    pub fn execute<B: Backend>(&self, device: B::Device) -> Result<Evaluation> {
        let ckpt = CheckpointManager::open(&self.checkpoint_dir)?;
        let inferencer = Inferencer::<B>::from_checkpoint(&ckpt, device.clone())
            .with_context(|| format!("Cannot restore the model from '{}'", self.checkpoint_dir))?;

        let mut cfg = inferencer.config().clone();
        if self.data_dir.is_some() {
            cfg.data_dir = self.data_dir.clone();
        }

        let source = cfg.source();
        let split = source
            .load(cfg.vocab_size())
            .with_context(|| format!("Failed to load reviews from {}", source.describe()))?;

        let preprocessor = SequencePreprocessor::new(cfg.seq_len())?;
        let test = ReviewDataset::new(
            preprocessor.normalize_all(&split.test),
            cfg.seq_len(),
            cfg.vocab_size(),
        )?;

        let batch_size = self.batch_size.unwrap_or(cfg.batch_size);
        let eval = evaluate(inferencer.model(), &test, batch_size, &device)?;
        tracing::info!(
            "Test accuracy: {:.2}% ({}/{})",
            eval.accuracy * 100.0, eval.correct, eval.total
        );
        Ok(eval)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        predict_use_case::PredictUseCase,
        train_use_case::{TrainConfig, TrainUseCase, Validation},
    };
    use crate::ml::stage::{ModelConfig, StackSizes};

    type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
    type EvalBackend  = burn::backend::NdArray;

    #[test]
    fn test_reloaded_checkpoint_scores_the_test_partition() {
        let tmp = tempfile::tempdir().unwrap();
        let sizes = StackSizes { vocab_size: 32, seq_len: 8, embedding_dim: 4, hidden: 4,
                                 ..StackSizes::default() };
        let cfg = TrainConfig {
            checkpoint_dir:    tmp.path().to_string_lossy().into_owned(),
            synthetic_reviews: 16,
            epochs:            1,
            batch_size:        4,
            validation:        Validation::None,
            ..TrainConfig::from_model(ModelConfig::baseline(&sizes).unwrap())
        };
        TrainUseCase::new(cfg.clone()).execute::<TrainBackend>(Default::default()).unwrap();

        let dir = cfg.checkpoint_dir.clone();
        let eval = EvaluateUseCase::new(dir.clone(), None, Some(5))
            .execute::<EvalBackend>(Default::default())
            .unwrap();
        assert_eq!(eval.total, 16);
        assert!((0.0..=1.0).contains(&eval.accuracy));

        let preds = PredictUseCase::new(dir)
            .execute::<EvalBackend>(Default::default(), &["1,2,3".to_string(), "".to_string()])
            .unwrap();
        assert_eq!(preds.len(), 2);
        assert!(preds.iter().all(|p| (0.0..=1.0).contains(&p.probability)));
    }

    #[test]
    fn test_missing_checkpoint_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("never-trained").to_string_lossy().into_owned();
        assert!(EvaluateUseCase::new(missing, None, None)
            .execute::<EvalBackend>(Default::default())
            .is_err());
    }
}
