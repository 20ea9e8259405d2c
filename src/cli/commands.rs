// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `predict`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, enums, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::fs;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{TrainConfig, Validation};
use crate::ml::stage::{ModelConfig, StackSizes};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the sentiment classifier
    Train(TrainArgs),

    /// Score a trained checkpoint on the test partition
    Evaluate(EvaluateArgs),

    /// Print P(positive) for comma-separated word-rank lists
    Predict(PredictArgs),
}

/// Which reference stack to build
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Architecture {
    /// Embedding → LSTM → Output
    Baseline,
    /// Embedding → Dropout → LSTM → Dropout → Output
    Dropout,
    /// Embedding → Conv1d → MaxPool → LSTM → Output
    Convolutional,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationSource {
    None,
    /// Score the test partition after every epoch
    Test,
    /// Hold out part of the training partition
    Holdout,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// CPU
    #[default]
    Ndarray,
    /// GPU through wgpu
    Wgpu,
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory with train.jsonl and test.jsonl.
    /// Synthetic reviews are generated when omitted.
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Directory to save checkpoints, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of most frequent words kept (K)
    #[arg(long, default_value_t = 5000)]
    pub vocab_size: usize,

    /// Every review is truncated / left-padded to this length (L)
    #[arg(long, default_value_t = 500)]
    pub seq_len: usize,

    /// Rank that replaces words outside the vocabulary (dropped if unset)
    #[arg(long)]
    pub oov_token: Option<u32>,

    /// Reviews per partition when generating synthetic data
    #[arg(long, default_value_t = 2000)]
    pub synthetic_reviews: usize,

    #[arg(long, value_enum, default_value_t = Architecture::Baseline)]
    pub architecture: Architecture,

    /// JSON file with a full stage stack; overrides --architecture,
    /// --vocab-size and --seq-len
    #[arg(long)]
    pub stack: Option<String>,

    /// Width of each word vector
    #[arg(long, default_value_t = 32)]
    pub embedding_dim: usize,

    /// LSTM hidden units
    #[arg(long, default_value_t = 100)]
    pub hidden: usize,

    /// Convolution filters
    #[arg(long, default_value_t = 32)]
    pub filters: usize,

    /// Convolution kernel width (odd)
    #[arg(long, default_value_t = 3)]
    pub kernel: usize,

    /// Max-pooling factor
    #[arg(long, default_value_t = 2)]
    pub pool: usize,

    /// Dropout probability
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seed for parameter initialisation, dropout, synthetic data and holdout
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = ValidationSource::Test)]
    pub validation: ValidationSource,

    /// Fraction of the training partition held out with --validation holdout
    #[arg(long, default_value_t = 0.2)]
    pub holdout_fraction: f64,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,
}

impl TrainArgs {
    fn sizes(&self) -> StackSizes {
        StackSizes {
            vocab_size:    self.vocab_size,
            seq_len:       self.seq_len,
            embedding_dim: self.embedding_dim,
            hidden:        self.hidden,
            filters:       self.filters,
            kernel:        self.kernel,
            pool:          self.pool,
            dropout:       self.dropout,
        }
    }

    fn model_config(&self) -> Result<ModelConfig> {
        if let Some(path) = &self.stack {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Cannot read stage stack from '{path}'"))?;
            return serde_json::from_str(&json)
                .with_context(|| format!("Invalid stage stack in '{path}'"));
        }
        let sizes = self.sizes();
        let cfg = match self.architecture {
            Architecture::Baseline      => ModelConfig::baseline(&sizes),
            Architecture::Dropout       => ModelConfig::with_dropout(&sizes),
            Architecture::Convolutional => ModelConfig::convolutional(&sizes),
        };
        Ok(cfg?)
    }

    /// Convert CLI args into the application-layer TrainConfig.
    /// The application layer never sees clap types.
    pub fn into_config(self) -> Result<TrainConfig> {
        let model = self.model_config()?;
        let validation = match self.validation {
            ValidationSource::None    => Validation::None,
            ValidationSource::Test    => Validation::Test,
            ValidationSource::Holdout => Validation::Holdout { fraction: self.holdout_fraction },
        };
        Ok(TrainConfig {
            data_dir:          self.data_dir,
            checkpoint_dir:    self.checkpoint_dir,
            oov_token:         self.oov_token,
            synthetic_reviews: self.synthetic_reviews,
            model,
            epochs:            self.epochs,
            batch_size:        self.batch_size,
            lr:                self.lr,
            seed:              self.seed,
            validation,
        })
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Score this corpus directory instead of the one used for training
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Defaults to the training batch size
    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// A review as comma-separated word ranks, e.g. "1,14,22,16".
    /// Repeat the flag to score several reviews.
    #[arg(long = "tokens", required = true)]
    pub reviews: Vec<String>,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;
    use crate::ml::stage::Stage;

    fn train_args(args: &[&str]) -> TrainArgs {
        let argv = ["review-sentiment", "train"].iter().chain(args);
        match Cli::parse_from(argv).command {
            Commands::Train(a) => a,
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_match_the_reference_run() {
        let cfg = train_args(&[]).into_config().unwrap();
        assert_eq!(cfg.vocab_size(), 5000);
        assert_eq!(cfg.seq_len(), 500);
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.validation, Validation::Test);
        assert_eq!(cfg.model, ModelConfig::baseline(&StackSizes::default()).unwrap());
    }

    #[test]
    fn test_architecture_and_holdout_flags() {
        let cfg = train_args(&[
            "--architecture", "convolutional",
            "--validation", "holdout",
            "--holdout-fraction", "0.1",
            "--vocab-size", "100",
            "--seq-len", "40",
        ])
        .into_config()
        .unwrap();
        assert_eq!(cfg.validation, Validation::Holdout { fraction: 0.1 });
        assert!(cfg.model.stages().iter().any(|s| matches!(s, Stage::Pooling { factor: 2 })));
        assert_eq!(cfg.model.recurrent_len(), 20);
    }

    #[test]
    fn test_stack_file_overrides_architecture() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stack.json");
        fs::write(&path, r#"{"seq_len": 12, "stages": [
            {"stage": "embedding", "vocab_size": 50, "width": 8},
            {"stage": "recurrent", "input": 8, "hidden": 6},
            {"stage": "output", "input": 6}
        ]}"#).unwrap();

        let cfg = train_args(&["--stack", path.to_str().unwrap()]).into_config().unwrap();
        assert_eq!(cfg.vocab_size(), 50);
        assert_eq!(cfg.seq_len(), 12);

        // Width mismatch is refused while parsing the file
        fs::write(&path, r#"{"seq_len": 12, "stages": [
            {"stage": "embedding", "vocab_size": 50, "width": 8},
            {"stage": "recurrent", "input": 16, "hidden": 6},
            {"stage": "output", "input": 6}
        ]}"#).unwrap();
        assert!(train_args(&["--stack", path.to_str().unwrap()]).into_config().is_err());
    }

    #[test]
    fn test_predict_accepts_repeated_reviews() {
        let cli = Cli::parse_from(["review-sentiment", "predict", "--tokens", "1,2", "--tokens", "3"]);
        match cli.command {
            Commands::Predict(a) => assert_eq!(a.reviews, vec!["1,2", "3"]),
            other => panic!("expected predict, got {other:?}"),
        }
    }
}
