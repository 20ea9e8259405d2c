// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only sees ReviewSource, so a corpus on
// disk and the synthetic generator are interchangeable.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::review::DatasetSplit;
use crate::error::Result;

// ─── ReviewSource ─────────────────────────────────────────────────────────────
/// Anything that can hand out a train/test split of pre-indexed reviews.
///
/// Implementations:
///   - JsonlReviewSource     → reads `train.jsonl` / `test.jsonl`
///   - SyntheticReviewSource → seeded generator for demos and tests
pub trait ReviewSource {
    /// Load both partitions with every token in `[0, vocab_size)`.
    /// Fails with a configuration error if `vocab_size` is zero.
    fn load(&self, vocab_size: usize) -> Result<DatasetSplit>;

    /// Short name used in logs
    fn describe(&self) -> String;
}
