// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The Burn-specific half of the pipeline: model building,
// training, scoring and inference.
//
// What's in this layer:
//
//   stage.rs      — Stage descriptors and the validated stack
//                   (ModelConfig) plus the three reference stacks:
//                   • baseline:      Embedding → LSTM → Output
//                   • dropout:       Embedding → Dropout → LSTM
//                                    → Dropout → Output
//                   • convolutional: Embedding → Conv1d → MaxPool
//                                    → LSTM → Output
//
//   model.rs      — Builds the Burn module from a stack and runs
//                   the forward pass / binary cross-entropy loss
//
//   trainer.rs    — TrainingController: Adam updates per batch,
//                   per-epoch metrics, optional validation
//
//   evaluator.rs  — Held-out accuracy and loss
//
//   inferencer.rs — Loads a checkpoint and scores token sequences
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Hochreiter & Schmidhuber (1997) Long Short-Term Memory

/// Stage descriptors and stack validation
pub mod stage;

/// LSTM sentiment classifier built from a stage stack
pub mod model;

/// Training loop with optional validation
pub mod trainer;

/// Accuracy and loss on held-out reviews
pub mod evaluator;

/// Loads a checkpoint and scores reviews
pub mod inferencer;
