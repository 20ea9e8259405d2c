// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the train/test split  (Layer 4 - data)
//   Step 2: Normalise to length L      (Layer 4 - data)
//   Step 3: Pick validation data       (Layer 4 - data)
//   Step 4: Build datasets             (Layer 4 - data)
//   Step 5: Save config                (Layer 6 - infra)
//   Step 6: Seed + build the model     (Layer 5 - ml)
//   Step 7: Run the training loop      (Layer 5 - ml)
//   Step 8: Score the test partition   (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    optim::AdamConfig,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::ReviewDataset,
    jsonl_source::{JsonlReviewSource, OutOfVocabulary},
    preprocessor::SequencePreprocessor,
    splitter::split_train_val,
    synthetic::SyntheticReviewSource,
};
use crate::domain::traits::ReviewSource;
use crate::error::PipelineError;
use crate::infra::{checkpoint::CheckpointManager, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::{
    evaluator::{evaluate, Evaluation},
    stage::ModelConfig,
    trainer::TrainingController,
};

// ─── Validation Mode ─────────────────────────────────────────────────────────
/// Which reviews are scored at the end of every epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Validation {
    /// No per-epoch validation
    None,
    /// Score the test partition (what the reference notebook does)
    Test,
    /// Hold out a seeded fraction of the training partition
    Holdout { fraction: f64 },
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything needed to reproduce a run. Saved next to the
// checkpoint so evaluation and inference rebuild the same model
// and read the same data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Directory with train.jsonl / test.jsonl; synthetic reviews when absent
    pub data_dir:          Option<String>,
    pub checkpoint_dir:    String,
    /// Replacement rank for tokens at or above the vocabulary cap;
    /// such tokens are dropped when absent
    pub oov_token:         Option<u32>,
    /// Reviews per partition when generating synthetic data
    pub synthetic_reviews: usize,
    pub model:             ModelConfig,
    pub epochs:            usize,
    pub batch_size:        usize,
    pub lr:                f64,
    pub seed:              u64,
    pub validation:        Validation,
}

impl TrainConfig {
    /// Reference run settings around the given stack.
    pub fn from_model(model: ModelConfig) -> Self {
        Self {
            data_dir:          None,
            checkpoint_dir:    "checkpoints".to_string(),
            oov_token:         None,
            synthetic_reviews: 2000,
            model,
            epochs:            3,
            batch_size:        64,
            lr:                1e-3,
            seed:              7,
            validation:        Validation::Test,
        }
    }

    pub fn vocab_size(&self) -> usize { self.model.vocab_size() }

    pub fn seq_len(&self) -> usize { self.model.seq_len() }

    /// Checks the run-level settings the stage stack can't see.
    pub fn check(&self) -> crate::error::Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::config("batch size must be positive"));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(PipelineError::config(format!("learning rate must be positive, got {}", self.lr)));
        }
        if let Validation::Holdout { fraction } = self.validation {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(PipelineError::config(format!(
                    "holdout fraction must lie in (0, 1), got {fraction}"
                )));
            }
        }
        if self.data_dir.is_none() && self.synthetic_reviews == 0 {
            return Err(PipelineError::config("synthetic review count must be positive"));
        }
        Ok(())
    }

    /// The provider this configuration reads from.
    pub fn source(&self) -> Box<dyn ReviewSource> {
        match &self.data_dir {
            Some(dir) => {
                let policy = self.oov_token.map_or(OutOfVocabulary::Drop, OutOfVocabulary::Replace);
                Box::new(JsonlReviewSource::new(dir).with_out_of_vocabulary(policy))
            }
            None => {
                // Lengths straddle L so both truncation and padding occur
                let l = self.seq_len();
                Box::new(SyntheticReviewSource::new(
                    self.synthetic_reviews,
                    (l / 2).max(1),
                    l + l / 2,
                    self.seed,
                ))
            }
        }
    }
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub history: Vec<EpochMetrics>,
    pub test:    Evaluation,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end on backend `B`.
    pub fn execute<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.check()?;
        tracing::info!(
            "Model stack: {} ({} steps reach the LSTM)",
            cfg.model.summary(),
            cfg.model.recurrent_len()
        );

        // ── Step 1: Load the split ────────────────────────────────────────────
        let source = cfg.source();
        tracing::info!("Loading reviews from {}", source.describe());
        let split = source
            .load(cfg.vocab_size())
            .with_context(|| format!("Failed to load reviews from {}", source.describe()))?;
        let (train_pos, test_pos) = split.positive_counts();
        tracing::info!(
            "Loaded {} training reviews ({} positive), {} test reviews ({} positive)",
            split.train.len(), train_pos, split.test.len(), test_pos
        );

        // ── Step 2: Normalise every review to length L ────────────────────────
        let preprocessor = SequencePreprocessor::new(cfg.seq_len())?;
        let train = preprocessor.normalize_all(&split.train);
        let test  = preprocessor.normalize_all(&split.test);

        // ── Step 3 + 4: Validation data and datasets ──────────────────────────
        let (train, holdout) = match cfg.validation {
            Validation::Holdout { fraction } => {
                let (train, val) = split_train_val(train, 1.0 - fraction, cfg.seed);
                (train, Some(val))
            }
            Validation::None | Validation::Test => (train, None),
        };

        let (k, l) = (cfg.vocab_size(), cfg.seq_len());
        let train_ds = ReviewDataset::new(train, l, k)?;
        let test_ds  = ReviewDataset::new(test, l, k)?;
        let val_ds = match (cfg.validation, holdout) {
            (Validation::Holdout { .. }, Some(val)) => Some(ReviewDataset::new(val, l, k)?),
            (Validation::Test, _) => Some(test_ds.clone()),
            _ => None,
        };
        check_not_empty(&train_ds, &test_ds, val_ds.as_ref(), cfg.epochs)?;

        // ── Step 5: Save config for evaluation / inference ────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", cfg.checkpoint_dir))?;
        ckpt.save_config(cfg)?;
        let metrics = MetricsLogger::create(&cfg.checkpoint_dir)?;

        // ── Step 6: Seeded model ──────────────────────────────────────────────
        B::seed(cfg.seed);
        let model = cfg.model.init::<B>(&device);

        // ── Step 7: Training loop ─────────────────────────────────────────────
        let mut trainer = TrainingController::new(model, AdamConfig::new().init(), cfg.lr, device.clone());
        let history = trainer.fit_with_callback(
            &train_ds,
            cfg.epochs,
            cfg.batch_size,
            val_ds.as_ref(),
            |model, m| {
                ckpt.save_model(model, m.epoch)?;
                metrics.log(m)
            },
        )?;
        if history.is_empty() {
            // Keep something loadable even for an untrained run
            ckpt.save_model(trainer.model(), 0)?;
        }

        // ── Step 8: Held-out accuracy ─────────────────────────────────────────
        let model = trainer.into_model().valid();
        let test = evaluate(&model, &test_ds, cfg.batch_size, &device)
            .context("Failed to evaluate on the test partition")?;
        tracing::info!("Test accuracy: {:.2}%", test.accuracy * 100.0);

        Ok(TrainReport { history, test })
    }
}

/// Fails before anything is written when a partition the run
/// needs has no reviews.
fn check_not_empty(
    train:      &ReviewDataset,
    test:       &ReviewDataset,
    validation: Option<&ReviewDataset>,
    epochs:     usize,
) -> crate::error::Result<()> {
    if epochs > 0 && train.sample_count() == 0 {
        return Err(PipelineError::data("training set is empty"));
    }
    if test.sample_count() == 0 {
        return Err(PipelineError::data("test set is empty"));
    }
    if validation.is_some_and(|v| v.sample_count() == 0) {
        return Err(PipelineError::data("validation set is empty"));
    }
    Ok(())
}
