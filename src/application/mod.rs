// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal: train a classifier, score it, or use it.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Reload a checkpoint and score the test partition
pub mod evaluate_use_case;

// Reload a checkpoint and score hand-written reviews
pub mod predict_use_case;
