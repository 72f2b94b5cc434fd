// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<ImageSample>
// into tensors on the target device.
//
// How batching works here:
//   Input:  Vec of N ImageSamples, each 784 raw pixels
//   Output: ImageBatch with images [N, 784] and targets [N]
//
//   Every image is normalised, all pixels are flattened into
//   one long Vec<f32>, then reshaped:
//   [img1_p1, ..., img1_p784, img2_p1, ..., imgN_p784] → [N, 784]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::preprocessor::Normalizer;
use crate::domain::image::{ImageSample, IMAGE_PIXELS};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
/// A batch of images ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Normalised pixels — shape: [batch_size, 784]
    pub images: Tensor<B, 2>,

    /// Class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    /// The device to create tensors on
    pub device:     B::Device,
    pub normalizer: Normalizer,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, normalizer: Normalizer::default() }
    }
}

impl<B: Backend> Batcher<ImageSample, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageSample>) -> ImageBatch<B> {
        let batch_size = items.len();

        // ── Flatten normalised pixels ─────────────────────────────────────────
        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| self.normalizer.normalize(&s.pixels))
            .collect();

        let labels: Vec<i64> = items
            .iter()
            .map(|s| s.label as i64)
            .collect();

        let images = Tensor::<B, 2>::from_data(
            TensorData::new(pixels, [batch_size, IMAGE_PIXELS]),
            &self.device,
        );

        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        ImageBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![
            ImageSample::new(vec![0; IMAGE_PIXELS], 3),
            ImageSample::new(vec![255; IMAGE_PIXELS], 8),
        ]);

        assert_eq!(batch.images.dims(), [2, IMAGE_PIXELS]);
        assert_eq!(batch.targets.dims(), [2]);

        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![3, 8]);

        let pixels: Vec<f32> = batch.images.into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(pixels[0], -1.0);
        assert_eq!(pixels[IMAGE_PIXELS], 1.0);
    }
}
