// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn-specific model code lives here. Tensors, autodiff,
// optimizers and losses come from Burn; this layer only wires
// them together.
//
//   model.rs       — The feed-forward classifier
//                    • configurable hidden widths
//                    • ReLU + dropout after every hidden layer
//                    • linear output layer producing class scores
//
//   state_dict.rs  — Named parameter snapshot
//                    Extracts every weight and bias by name and
//                    loads them back with shape checking
//
//   trainer.rs     — The training loop
//                    Forward pass, loss, backward pass, optimizer
//                    step, periodic held-out evaluation
//
//   inferencer.rs  — The inference engine
//                    Restores a checkpoint, scores single images
//                    and whole splits
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

use burn::tensor::backend::Backend;

/// Feed-forward classifier architecture
pub mod model;

/// Parameter name → tensor mapping with shape-checked loading
pub mod state_dict;

/// Training loop with periodic validation
pub mod trainer;

/// Inference engine — loads a checkpoint and predicts classes
pub mod inferencer;

/// Backend used for evaluation and inference
#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

/// Backend used for training (records gradients)
pub type TrainBackend = burn::backend::Autodiff<InnerBackend>;

pub fn default_device() -> <InnerBackend as Backend>::Device {
    Default::default()
}
