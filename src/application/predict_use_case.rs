// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Classifies one test image with a restored model and renders
// the image next to its class probabilities as plain text:
//
//              ..:::..           Ankle boot   0.912 ██████████████████
//          ..:=#%%%%#=:.         Sneaker      0.061 █
//          ...                   ...

use anyhow::{ensure, Result};

use crate::data::loader::IdxLoader;
use crate::domain::dataset_kind::{DatasetKind, Split};
use crate::domain::image::{ImageSample, Prediction, IMAGE_SIDE};
use crate::domain::traits::{ImageClassifier, ImageSource};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;
use crate::ml::{default_device, InnerBackend};

const SHADES: &[u8] = b" .:-=+*#%@";
const BAR_WIDTH: usize = 20;

pub struct PredictUseCase {
    pub checkpoint_dir: String,
    pub data_dir:       String,
    pub dataset:        DatasetKind,
    /// Index into the test split
    pub index:          usize,
    pub top_k:          usize,
}

/// What the CLI prints for one prediction
pub struct PredictionReport {
    pub sample:      ImageSample,
    pub true_class:  String,
    pub predictions: Vec<Prediction>,
}

impl PredictUseCase {
    pub fn execute(&self) -> Result<PredictionReport> {
        let ckpt       = CheckpointManager::open(&self.checkpoint_dir);
        let inferencer = Inferencer::<InnerBackend>::from_checkpoint(&ckpt, self.dataset, default_device())?;

        let samples = IdxLoader::new(&self.data_dir, self.dataset)
            .with_limit(Some(self.index.saturating_add(1)))
            .load_split(Split::Test)?;
        ensure!(
            self.index < samples.len(),
            "test split has only {} images, index {} is out of range",
            samples.len(),
            self.index
        );

        let sample      = samples[self.index].clone();
        let predictions = inferencer.classify(&sample, self.top_k)?;
        let true_class  = self.dataset.class_name(sample.label as usize);

        Ok(PredictionReport { sample, true_class, predictions })
    }
}

impl PredictionReport {
    /// Image on the left, probability bars on the right
    pub fn render(&self) -> String {
        let image = render_image(&self.sample);
        let bars  = render_bars(&self.predictions);

        let mut out = format!("True class: {}\n", self.true_class);
        for (row, line) in image.iter().enumerate() {
            out.push_str(line);
            if let Some(bar) = bars.get(row) {
                out.push_str("   ");
                out.push_str(bar);
            }
            out.push('\n');
        }
        out
    }
}

/// One text line per pixel row, darker pixels get denser glyphs
pub fn render_image(sample: &ImageSample) -> Vec<String> {
    (0..IMAGE_SIDE)
        .map(|row| {
            (0..IMAGE_SIDE)
                .map(|col| {
                    let p   = sample.pixel_at(row, col).unwrap_or(0) as usize;
                    let idx = p * (SHADES.len() - 1) / 255;
                    SHADES[idx] as char
                })
                .collect()
        })
        .collect()
}

pub fn render_bars(predictions: &[Prediction]) -> Vec<String> {
    let name_width = predictions
        .iter()
        .map(|p| p.class_name.len())
        .max()
        .unwrap_or(0);

    predictions
        .iter()
        .map(|p| {
            let filled = (p.probability.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
            format!(
                "{:<width$} {:.3} {}",
                p.class_name,
                p.probability,
                "█".repeat(filled),
                width = name_width
            )
        })
        .collect()
}
