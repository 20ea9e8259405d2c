// ============================================================
// Layer 5 — Stage Descriptors
// ============================================================
// The classifier is declared as an ordered list of stages:
//
//   Embedding → [Convolution | Pooling | Dropout]* → Recurrent
//             → [Dropout]* → Output
//
// Each stage names the width it expects as input, so a stack
// like "Embedding(width 32) → Recurrent(input 64)" is rejected
// here, before any tensor exists.
//
// Widths through the stack:
//   Embedding{K, D}        tokens  → D
//   Convolution{D, F, k}   D       → F      (same length, ReLU)
//   Pooling{p}             C       → C      (length / p)
//   Dropout{prob}          C       → C
//   Recurrent{C, H}        C       → H      (final hidden state)
//   Output{H}              H       → 1      (sigmoid)
//
// Reference: Burn Book §3 (Building Blocks)

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Embedding   { vocab_size: usize, width: usize },
    Convolution { channels_in: usize, filters: usize, kernel: usize },
    Pooling     { factor: usize },
    Dropout     { prob: f64 },
    Recurrent   { input: usize, hidden: usize },
    Output      { input: usize },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Embedding { .. }   => "embedding",
            Stage::Convolution { .. } => "convolution",
            Stage::Pooling { .. }     => "pooling",
            Stage::Dropout { .. }     => "dropout",
            Stage::Recurrent { .. }   => "recurrent",
            Stage::Output { .. }      => "output",
        }
    }
}

// ─── StackSizes ───────────────────────────────────────────────────────────────
/// Sizes used by the reference stacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackSizes {
    pub vocab_size:    usize,
    pub seq_len:       usize,
    pub embedding_dim: usize,
    pub hidden:        usize,
    pub filters:       usize,
    pub kernel:        usize,
    pub pool:          usize,
    pub dropout:       f64,
}

impl Default for StackSizes {
    fn default() -> Self {
        Self {
            vocab_size:    5000,
            seq_len:       500,
            embedding_dim: 32,
            hidden:        100,
            filters:       32,
            kernel:        3,
            pool:          2,
            dropout:       0.2,
        }
    }
}

// ─── ModelConfig ──────────────────────────────────────────────────────────────
/// A validated, immutable stage stack plus the input length L.
///
/// The only ways to obtain one are `ModelConfig::new`, the reference
/// constructors, and deserialisation, and all three validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModelConfig", into = "RawModelConfig")]
pub struct ModelConfig {
    seq_len: usize,
    stages:  Vec<Stage>,
}

#[derive(Serialize, Deserialize)]
struct RawModelConfig {
    seq_len: usize,
    stages:  Vec<Stage>,
}

impl TryFrom<RawModelConfig> for ModelConfig {
    type Error = PipelineError;

    fn try_from(raw: RawModelConfig) -> Result<Self> {
        ModelConfig::new(raw.seq_len, raw.stages)
    }
}

impl From<ModelConfig> for RawModelConfig {
    fn from(cfg: ModelConfig) -> Self {
        RawModelConfig { seq_len: cfg.seq_len, stages: cfg.stages }
    }
}

impl ModelConfig {
    pub fn new(seq_len: usize, stages: Vec<Stage>) -> Result<Self> {
        validate(seq_len, &stages)?;
        Ok(Self { seq_len, stages })
    }

    /// Embedding → LSTM → Output
    pub fn baseline(s: &StackSizes) -> Result<Self> {
        Self::new(s.seq_len, vec![
            Stage::Embedding { vocab_size: s.vocab_size, width: s.embedding_dim },
            Stage::Recurrent { input: s.embedding_dim, hidden: s.hidden },
            Stage::Output    { input: s.hidden },
        ])
    }

    /// Embedding → Dropout → LSTM → Dropout → Output
    pub fn with_dropout(s: &StackSizes) -> Result<Self> {
        Self::new(s.seq_len, vec![
            Stage::Embedding { vocab_size: s.vocab_size, width: s.embedding_dim },
            Stage::Dropout   { prob: s.dropout },
            Stage::Recurrent { input: s.embedding_dim, hidden: s.hidden },
            Stage::Dropout   { prob: s.dropout },
            Stage::Output    { input: s.hidden },
        ])
    }

    /// Embedding → Conv1d + ReLU → MaxPool → LSTM → Output
    pub fn convolutional(s: &StackSizes) -> Result<Self> {
        Self::new(s.seq_len, vec![
            Stage::Embedding   { vocab_size: s.vocab_size, width: s.embedding_dim },
            Stage::Convolution { channels_in: s.embedding_dim, filters: s.filters, kernel: s.kernel },
            Stage::Pooling     { factor: s.pool },
            Stage::Recurrent   { input: s.filters, hidden: s.hidden },
            Stage::Output      { input: s.hidden },
        ])
    }

    pub fn seq_len(&self) -> usize { self.seq_len }

    pub fn stages(&self) -> &[Stage] { &self.stages }

    pub fn vocab_size(&self) -> usize {
        match self.stages[0] {
            Stage::Embedding { vocab_size, .. } => vocab_size,
            _ => unreachable!("validated stacks start with an embedding"),
        }
    }

    /// Sequence length reaching the recurrent stage (after pooling)
    pub fn recurrent_len(&self) -> usize {
        self.stages
            .iter()
            .filter_map(|s| match s {
                Stage::Pooling { factor } => Some(*factor),
                _ => None,
            })
            .fold(self.seq_len, |len, factor| len / factor)
    }

    /// Short human-readable summary, e.g. "embedding(5000x32) > recurrent(100) > output"
    pub fn summary(&self) -> String {
        self.stages
            .iter()
            .map(|s| match s {
                Stage::Embedding { vocab_size, width } => format!("embedding({vocab_size}x{width})"),
                Stage::Convolution { filters, kernel, .. } => format!("conv({filters}x{kernel})"),
                Stage::Pooling { factor } => format!("maxpool({factor})"),
                Stage::Dropout { prob } => format!("dropout({prob})"),
                Stage::Recurrent { hidden, .. } => format!("lstm({hidden})"),
                Stage::Output { .. } => "output".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

// ─── Validation ───────────────────────────────────────────────────────────────
fn validate(seq_len: usize, stages: &[Stage]) -> Result<()> {
    let err = |i: usize, s: &Stage, msg: String| {
        PipelineError::config(format!("stage {i} ({}): {msg}", s.name()))
    };

    if seq_len == 0 {
        return Err(PipelineError::config("sequence length must be positive"));
    }
    match stages.first() {
        Some(Stage::Embedding { .. }) => {}
        Some(s) => return Err(err(0, s, "the first stage must be an embedding".into())),
        None    => return Err(PipelineError::config("the stage stack is empty")),
    }
    let last = stages.len() - 1;
    if !matches!(stages[last], Stage::Output { .. }) {
        return Err(err(last, &stages[last], "the last stage must be the output".into()));
    }

    // Running (width, length) and whether the recurrent stage was passed
    let mut width = 0usize;
    let mut len   = seq_len;
    let mut seen_recurrent = false;

    for (i, stage) in stages.iter().enumerate() {
        let expect_width = |declared: usize, width: usize| -> Result<()> {
            if declared != width {
                return Err(err(i, stage, format!(
                    "expects input width {declared} but the previous stage produces {width}"
                )));
            }
            Ok(())
        };

        match *stage {
            Stage::Embedding { vocab_size, width: w } => {
                if i != 0 {
                    return Err(err(i, stage, "only the first stage may be an embedding".into()));
                }
                if vocab_size == 0 || w == 0 {
                    return Err(err(i, stage, "vocabulary size and width must be positive".into()));
                }
                width = w;
            }
            Stage::Convolution { channels_in, filters, kernel } => {
                if seen_recurrent {
                    return Err(err(i, stage, "must come before the recurrent stage".into()));
                }
                if filters == 0 || kernel == 0 {
                    return Err(err(i, stage, "filters and kernel must be positive".into()));
                }
                if kernel % 2 == 0 {
                    return Err(err(i, stage, format!("kernel {kernel} must be odd for same padding")));
                }
                expect_width(channels_in, width)?;
                width = filters;
            }
            Stage::Pooling { factor } => {
                if seen_recurrent {
                    return Err(err(i, stage, "must come before the recurrent stage".into()));
                }
                if factor == 0 {
                    return Err(err(i, stage, "factor must be positive".into()));
                }
                if len / factor == 0 {
                    return Err(err(i, stage, format!(
                        "pooling length {len} by {factor} leaves no positions"
                    )));
                }
                len /= factor;
            }
            Stage::Dropout { prob } => {
                if !(0.0..1.0).contains(&prob) {
                    return Err(err(i, stage, format!("probability {prob} is outside [0, 1)")));
                }
            }
            Stage::Recurrent { input, hidden } => {
                if seen_recurrent {
                    return Err(err(i, stage, "only one recurrent stage is supported".into()));
                }
                if hidden == 0 {
                    return Err(err(i, stage, "hidden width must be positive".into()));
                }
                expect_width(input, width)?;
                width = hidden;
                seen_recurrent = true;
            }
            Stage::Output { input } => {
                if i != last {
                    return Err(err(i, stage, "only the last stage may be the output".into()));
                }
                if !seen_recurrent {
                    return Err(err(i, stage, "a recurrent stage must precede the output".into()));
                }
                expect_width(input, width)?;
            }
        }
    }

    Ok(())
}
