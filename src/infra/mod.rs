// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by the other layers:
//
//   checkpoint.rs — Saving and loading trained models
//                   Writes architecture metadata plus every
//                   parameter tensor to one .safetensors file,
//                   and the run's TrainConfig as JSON.
//
//   metrics.rs    — Training metrics logging
//                   Appends each periodic evaluation (loss,
//                   accuracy) to a CSV file.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Evaluation metrics CSV logger
pub mod metrics;
