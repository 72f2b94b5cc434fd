// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

// Train a classifier and save a checkpoint
pub mod train_use_case;

// Measure a saved checkpoint on the test split
pub mod evaluate_use_case;

// Classify a single test image
pub mod predict_use_case;

// Describe a saved checkpoint
pub mod inspect_use_case;
