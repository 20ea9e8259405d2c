// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved:
//   1. Model weights (.mpk file)    — all learned parameters
//   2. latest_epoch.json            — which epoch was last saved
//   3. train_config.json            — the full TrainConfig,
//                                     including the stage stack
//
// The weights alone cannot rebuild a model: the stage stack in
// train_config.json decides which modules exist, then the
// recorded parameters are loaded into them.
//
// File naming convention:
//   checkpoints/
//     model_epoch_0.mpk      ← untrained weights (epochs = 0)
//     model_epoch_1.mpk      ← weights after epoch 1
//     ...
//     latest_epoch.json      ← contains the number of latest epoch
//     train_config.json      ← training configuration
//     metrics.csv            ← written by MetricsLogger
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::error::{PipelineError, Result};
use crate::ml::model::SentimentModel;

const CONFIG_FILE: &str = "train_config.json";
const LATEST_FILE: &str = "latest_epoch.json";

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Opens an existing checkpoint directory without creating it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(PipelineError::Checkpoint(format!(
                "no checkpoint directory at '{}'. Have you run 'train' first?",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights for `epoch` and point latest_epoch.json at them.
    ///
    /// Works for the autodiff model as well as its inner-backend copy;
    /// the record holds plain parameter values either way.
    pub fn save_model<B: Backend>(&self, model: &SentimentModel<B>, epoch: usize) -> Result<()> {
        // The recorder appends the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .map_err(|e| PipelineError::Checkpoint(format!(
                "failed to save checkpoint to '{}': {e:?}", path.display()
            )))?;

        fs::write(self.dir.join(LATEST_FILE), serde_json::to_string(&epoch)?)?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the weights of the latest saved epoch into `model`.
    ///
    /// `model` must be built from the same stage stack as the saved one.
    pub fn load_model<B: Backend>(
        &self,
        model:  SentimentModel<B>,
        device: &B::Device,
    ) -> Result<SentimentModel<B>> {
        let epoch = self.latest_epoch()?;
        self.load_model_epoch(model, epoch, device)
    }

    pub fn load_model_epoch<B: Backend>(
        &self,
        model:  SentimentModel<B>,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<SentimentModel<B>> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .map_err(|e| PipelineError::Checkpoint(format!(
                "cannot load checkpoint '{}': {e:?}", path.display()
            )))?;

        Ok(model.load_record(record))
    }

    /// Must be called before training starts so evaluation and
    /// inference can rebuild the same stage stack.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).map_err(|e| PipelineError::Checkpoint(format!(
            "cannot read config from '{}' ({e}). Have you run 'train' first?",
            path.display()
        )))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Epoch number stored in latest_epoch.json.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_FILE);
        let s = fs::read_to_string(&path).map_err(|e| PipelineError::Checkpoint(format!(
            "cannot find '{}' ({e}). Have you run 'train' first?",
            path.display()
        )))?;
        Ok(serde_json::from_str::<usize>(s.trim())?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::stage::{ModelConfig, StackSizes};

    type TestBackend = burn::backend::NdArray;

    fn sizes() -> StackSizes {
        StackSizes { vocab_size: 20, seq_len: 8, embedding_dim: 3, hidden: 4,
                     ..StackSizes::default() }
    }

    #[test]
    fn test_weights_round_trip_through_latest_epoch() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path().join("ckpt")).unwrap();
        let device = Default::default();
        let cfg = ModelConfig::convolutional(&sizes()).unwrap();

        let saved = cfg.init::<TestBackend>(&device);
        ckpt.save_model(&saved, 0).unwrap();
        ckpt.save_model(&saved, 2).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        assert!(ckpt.dir().join("model_epoch_2.mpk").exists());

        let fresh = cfg.init::<TestBackend>(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        // CompactRecorder stores half precision
        let a: Vec<f32> = saved.output.weight.val().into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.output.weight.val().into_data().to_vec().unwrap();
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-2));
    }

    #[test]
    fn test_missing_checkpoint_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        assert!(matches!(ckpt.latest_epoch(), Err(PipelineError::Checkpoint(_))));
        assert!(matches!(ckpt.load_config(), Err(PipelineError::Checkpoint(_))));
        assert!(CheckpointManager::open(tmp.path().join("nope")).is_err());
    }
}
