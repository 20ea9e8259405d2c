// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds a trained classifier from its checkpoint directory
// and scores raw token sequences:
//
//   train_config.json → stage stack → fresh model
//   model_epoch_<n>   → weights loaded into it
//   tokens            → normalised to L → P(positive)
//
// Runs on a plain (non-autodiff) backend, so dropout is off.

use burn::prelude::*;

use crate::application::train_use_case::TrainConfig;
use crate::data::preprocessor::SequencePreprocessor;
use crate::error::{PipelineError, Result};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::SentimentModel;

pub struct Inferencer<B: Backend> {
    model:        SentimentModel<B>,
    config:       TrainConfig,
    preprocessor: SequencePreprocessor,
    device:       B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: B::Device) -> Result<Self> {
        let config = ckpt.load_config()?;
        let model  = config.model.init::<B>(&device);
        let model  = ckpt.load_model(model, &device)?;
        let preprocessor = SequencePreprocessor::new(config.model.seq_len())?;

        tracing::info!("Model loaded from checkpoint: {}", config.model.summary());
        Ok(Self { model, config, preprocessor, device })
    }

    pub fn model(&self) -> &SentimentModel<B> { &self.model }

    pub fn config(&self) -> &TrainConfig { &self.config }

    /// P(positive) for each sequence. Sequences may have any length;
    /// every token must lie below the model's vocabulary size.
    pub fn predict(&self, sequences: &[Vec<u32>]) -> Result<Vec<f32>> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let vocab_size = self.config.model.vocab_size();
        let seq_len    = self.preprocessor.seq_len();
        let mut flat   = Vec::with_capacity(sequences.len() * seq_len);

        for (i, seq) in sequences.iter().enumerate() {
            if let Some(&bad) = seq.iter().find(|&&t| t as usize >= vocab_size) {
                return Err(PipelineError::data(format!(
                    "sequence {i}: token {bad} is outside the vocabulary [0, {vocab_size})"
                )));
            }
            flat.extend(self.preprocessor.normalize(seq).into_iter().map(|t| t as i64));
        }

        let tokens = Tensor::<B, 2, Int>::from_data(
            TensorData::new(flat, [sequences.len(), seq_len]),
            &self.device,
        );

        let probs = self
            .model
            .probabilities(tokens)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::data(format!("cannot read predictions: {e:?}")))?;

        tracing::debug!("Scored {} sequences", probs.len());
        Ok(probs)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::stage::{ModelConfig, StackSizes};

    type TestBackend = burn::backend::NdArray;

    fn saved_checkpoint(dir: &std::path::Path) -> CheckpointManager {
        let sizes = StackSizes { vocab_size: 25, seq_len: 6, embedding_dim: 3, hidden: 4,
                                 ..StackSizes::default() };
        let cfg = TrainConfig::from_model(ModelConfig::convolutional(&sizes).unwrap());
        let ckpt = CheckpointManager::new(dir).unwrap();
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_model(&cfg.model.init::<TestBackend>(&Default::default()), 0).unwrap();
        ckpt
    }

    #[test]
    fn test_predicts_one_probability_per_sequence() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = saved_checkpoint(tmp.path());
        let inferencer = Inferencer::<TestBackend>::from_checkpoint(&ckpt, Default::default()).unwrap();

        // Short, empty and over-long reviews are all normalised first
        let probs = inferencer
            .predict(&[vec![1, 2, 3], vec![], (1..20).collect()])
            .unwrap();
        assert_eq!(probs.len(), 3);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));

        let alone = inferencer.predict(&[vec![1, 2, 3]]).unwrap()[0];
        assert!((alone - probs[0]).abs() < 1e-6);
        assert!(inferencer.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_tokens_outside_the_vocabulary() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = saved_checkpoint(tmp.path());
        let inferencer = Inferencer::<TestBackend>::from_checkpoint(&ckpt, Default::default()).unwrap();
        assert!(matches!(
            inferencer.predict(&[vec![1, 2], vec![25]]),
            Err(PipelineError::Data(_))
        ));
    }
}
