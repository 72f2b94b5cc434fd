// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::{ensure, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::batcher::ImageBatcher;
use crate::domain::dataset_kind::DatasetKind;
use crate::domain::image::{ImageSample, Prediction, IMAGE_PIXELS};
use crate::domain::traits::ImageClassifier;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::Classifier;
use crate::ml::trainer::{validate, EvalReport};

pub struct Inferencer<B: Backend> {
    model:   Classifier<B>,
    kind:    DatasetKind,
    batcher: ImageBatcher<B>,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: Classifier<B>, kind: DatasetKind, device: B::Device) -> Self {
        Self { model, kind, batcher: ImageBatcher::new(device) }
    }

    /// Restore the saved model. Fails when its input width is not one
    /// flattened image or its output width differs from `kind`'s classes.
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        kind:         DatasetKind,
        device:       B::Device,
    ) -> Result<Self> {
        let model = ckpt_manager.load_model::<B>(&device)?;
        let (input, output, hidden) = model.architecture();
        ensure!(
            input == IMAGE_PIXELS && output == kind.num_classes(),
            "Checkpoint '{}' maps {input} inputs to {output} classes, \
             but {kind} images have {IMAGE_PIXELS} pixels and {} classes",
            ckpt_manager.checkpoint_path().display(),
            kind.num_classes()
        );
        tracing::info!("Model loaded from checkpoint: {input} → {hidden:?} → {output}");
        Ok(Self::new(model, kind, device))
    }

    /// Softmax probability of every class for one image
    pub fn probabilities(&self, sample: &ImageSample) -> Result<Vec<f32>> {
        let batch = self.batcher.batch(vec![sample.clone()]);
        let probs = softmax(self.model.forward(batch.images), 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;
        Ok(probs)
    }

    /// Loss and accuracy over a whole split
    pub fn evaluate(&self, samples: &[ImageSample], batch_size: usize) -> EvalReport {
        let batches = samples
            .chunks(batch_size.max(1))
            .map(|chunk| self.batcher.batch(chunk.to_vec()));
        validate(&self.model, batches)
    }
}

impl<B: Backend> ImageClassifier for Inferencer<B> {
    fn classify(&self, sample: &ImageSample, top_k: usize) -> Result<Vec<Prediction>> {
        let probs = self.probabilities(sample)?;

        let mut ranked: Vec<(usize, f32)> = probs.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);

        let predictions = ranked
            .into_iter()
            .map(|(class_index, probability)| Prediction {
                class_index,
                class_name: self.kind.class_name(class_index),
                probability,
            })
            .collect::<Vec<_>>();

        if let Some(best) = predictions.first() {
            tracing::debug!(
                "Predicted '{}' with probability {:.4}",
                best.class_name,
                best.probability
            );
        }
        Ok(predictions)
    }
}
