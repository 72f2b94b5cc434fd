// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to data sources and trained
// models through these traits, never through the concrete
// IDX reader or the Burn-backed inferencer.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::dataset_kind::Split;
use crate::domain::image::{ImageSample, Prediction};

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Anything that can produce the labelled images of a dataset split.
///
/// Implementations:
///   - IdxLoader → reads MNIST-format IDX files from a directory
pub trait ImageSource {
    fn load_split(&self, split: Split) -> Result<Vec<ImageSample>>;
}

// ─── ImageClassifier ──────────────────────────────────────────────────────────
/// Anything that can score a single image against every class.
///
/// Implementations:
///   - Inferencer → a trained Classifier restored from a checkpoint
pub trait ImageClassifier {
    /// Return the `top_k` most probable classes, most probable first.
    fn classify(&self, sample: &ImageSample, top_k: usize) -> Result<Vec<Prediction>>;
}
