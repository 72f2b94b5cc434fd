// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// A single labelled 28x28 grey-scale image as stored in the
// IDX files, plus the result of classifying one.
//
// Pixels are kept as raw bytes (0 = background, 255 = ink).
// Normalisation to floats happens later in the data layer,
// so this type stays independent of any tensor library.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// Width and height of every image in MNIST and Fashion-MNIST
pub const IMAGE_SIDE: usize = 28;

/// Number of pixels in one flattened image (28 * 28)
pub const IMAGE_PIXELS: usize = IMAGE_SIDE * IMAGE_SIDE;

/// One raw image and its class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSample {
    /// Row-major pixel intensities, length IMAGE_PIXELS
    pub pixels: Vec<u8>,

    /// Class index in 0..num_classes
    pub label: u8,
}

impl ImageSample {
    pub fn new(pixels: Vec<u8>, label: u8) -> Self {
        Self { pixels, label }
    }

    /// Intensity at (row, col), or None outside the 28x28 grid
    pub fn pixel_at(&self, row: usize, col: usize) -> Option<u8> {
        if row >= IMAGE_SIDE || col >= IMAGE_SIDE {
            return None;
        }
        self.pixels.get(row * IMAGE_SIDE + col).copied()
    }
}

/// One scored class for a classified image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class_index: usize,
    pub class_name:  String,

    /// Softmax probability in [0, 1]
    pub probability: f32,
}
