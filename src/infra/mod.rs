// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the on-disk side of a training run:
//
//   checkpoint.rs — Saving and loading model weights
//                   Uses Burn's CompactRecorder to
//                   serialise model parameters to disk.
//                   Also saves/loads TrainConfig as JSON
//                   so evaluation and inference can rebuild
//                   the stage stack.
//
//   metrics.rs    — Training metrics logging
//                   Writes epoch-level metrics (loss,
//                   accuracy, validation loss/accuracy)
//                   to a CSV file for later analysis.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
