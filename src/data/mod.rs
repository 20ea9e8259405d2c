// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from pre-indexed reviews to tensor batches.
//
//   train.jsonl / test.jsonl      (or the synthetic generator)
//       │
//       ▼
//   ReviewSource       → loads the train/test split, applies the
//       │                vocabulary cap
//       ▼
//   SequencePreprocessor → truncates / left-pads to length L
//       │
//       ▼
//   ReviewDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ReviewBatcher      → stacks reviews into [batch, L] tensors
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads pre-indexed reviews from JSON Lines files
pub mod jsonl_source;

/// Seeded generator of learnable reviews
pub mod synthetic;

/// Truncates / pads reviews to a fixed length
pub mod preprocessor;

/// Implements Burn's Dataset trait for normalised reviews
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
