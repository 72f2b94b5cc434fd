// ============================================================
// Layer 4 — Pixel Normaliser
// ============================================================
// Converts raw pixel bytes into the float inputs the network
// is trained on.
//
// Two steps, applied per pixel:
//   1. Scale 0..=255 into 0.0..=1.0
//   2. Standardise: (x - mean) / std
//
// With the default mean = 0.5 and std = 0.5 the result lies in
// [-1.0, 1.0]: background pixels become -1.0, full ink 1.0.
//
// The image is already a flat row-major vector of 784 values,
// which is exactly the [batch, 784] input layout of the model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    pub mean: f32,
    pub std:  f32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

impl Normalizer {
    pub fn new(mean: f32, std: f32) -> Self {
        Self { mean, std }
    }

    pub fn normalize_pixel(&self, pixel: u8) -> f32 {
        (pixel as f32 / 255.0 - self.mean) / self.std
    }

    /// Normalise a whole image, preserving pixel order
    pub fn normalize(&self, pixels: &[u8]) -> Vec<f32> {
        pixels.iter().map(|&p| self.normalize_pixel(p)).collect()
    }
}
