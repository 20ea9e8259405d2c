// ============================================================
// Layer 3 — Review Domain Types
// ============================================================
// A review is an ordered list of word ranks. Rank 1 is the most
// frequent word in the source corpus, rank 0 is reserved for
// padding (and for "no token here").
//
// Example (pre-indexed, before padding):
//   tokens: [1, 14, 22, 16, 43, 530, 973]
//   label:  Positive
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Word rank reserved for padding.
pub const PAD_TOKEN: u32 = 0;

// ─── Label ────────────────────────────────────────────────────────────────────
/// Binary sentiment. Serialised as the integers 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    /// Label predicted from P(positive). Exactly 0.5 counts as negative.
    pub fn from_probability(p: f32) -> Self {
        if p > 0.5 {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = PipelineError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            other => Err(PipelineError::data(format!(
                "label must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.as_u8()
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Negative => write!(f, "negative"),
            Label::Positive => write!(f, "positive"),
        }
    }
}

// ─── LabeledReview ────────────────────────────────────────────────────────────
/// One review together with its sentiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledReview {
    pub tokens: Vec<u32>,
    pub label:  Label,
}

impl LabeledReview {
    pub fn new(tokens: Vec<u32>, label: Label) -> Self {
        Self { tokens, label }
    }

    /// Fails if any token is outside `[0, vocab_size)`.
    pub fn check_vocab(&self, vocab_size: usize) -> Result<()> {
        match self.tokens.iter().find(|&&t| t as usize >= vocab_size) {
            Some(t) => Err(PipelineError::data(format!(
                "token {t} is outside the vocabulary [0, {vocab_size})"
            ))),
            None => Ok(()),
        }
    }
}

// ─── DatasetSplit ─────────────────────────────────────────────────────────────
/// The two disjoint partitions a ReviewSource hands out.
#[derive(Debug, Clone, Default)]
pub struct DatasetSplit {
    pub train: Vec<LabeledReview>,
    pub test:  Vec<LabeledReview>,
}

impl DatasetSplit {
    pub fn new(train: Vec<LabeledReview>, test: Vec<LabeledReview>) -> Self {
        Self { train, test }
    }

    /// Count of positive reviews in (train, test)
    pub fn positive_counts(&self) -> (usize, usize) {
        let count = |v: &[LabeledReview]| {
            v.iter().filter(|r| r.label == Label::Positive).count()
        };
        (count(&self.train), count(&self.test))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_u8() {
        assert_eq!(Label::try_from(0).unwrap(), Label::Negative);
        assert_eq!(Label::try_from(1).unwrap(), Label::Positive);
        assert!(matches!(Label::try_from(2), Err(PipelineError::Data(_))));
    }

    #[test]
    fn test_label_json_round_trip_rejects_out_of_range() {
        let ok: LabeledReview =
            serde_json::from_str(r#"{"tokens":[1,2],"label":1}"#).unwrap();
        assert_eq!(ok.label, Label::Positive);
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"tokens":[1,2],"label":1}"#);

        let bad = serde_json::from_str::<LabeledReview>(r#"{"tokens":[1],"label":3}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(Label::from_probability(0.5), Label::Negative);
        assert_eq!(Label::from_probability(0.5001), Label::Positive);
        assert_eq!(Label::from_probability(0.1), Label::Negative);
    }

    #[test]
    fn test_check_vocab() {
        let r = LabeledReview::new(vec![0, 3, 9], Label::Negative);
        assert!(r.check_vocab(10).is_ok());
        assert!(matches!(r.check_vocab(9), Err(PipelineError::Data(_))));
    }
}
