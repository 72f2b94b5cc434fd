// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Single-threaded train loop using Burn's DataLoader, autodiff
// and a library optimizer (Adam or SGD).
//
// Per training batch:
//   forward → cross-entropy loss → backward → optimizer step
//
// Every `print_every` steps the current weights are evaluated
// on the held-out set:
//   - model.valid() returns the model on the inner backend
//     with dropout disabled
//   - the running training loss is averaged over the last
//     `print_every` steps, reported, then reset
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::{fmt, str::FromStr};

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
};
use crate::infra::metrics::{EvalRecord, MetricsLogger};
use crate::ml::model::Classifier;
use crate::ml::{default_device, InnerBackend, TrainBackend};

// ─── OptimizerKind ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerKind::Adam => write!(f, "adam"),
            OptimizerKind::Sgd  => write!(f, "sgd"),
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(OptimizerKind::Adam),
            "sgd"  => Ok(OptimizerKind::Sgd),
            other  => Err(format!("unknown optimizer '{other}', expected 'adam' or 'sgd'")),
        }
    }
}

// ─── EvalReport ───────────────────────────────────────────────────────────────
/// Loss and accuracy of a model over a whole held-out set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Mean of the per-batch mean losses, NaN for an empty set
    pub loss:     f64,
    /// correct / samples, 0.0 for an empty set
    pub accuracy: f64,
    pub batches:  usize,
    pub samples:  usize,
}

/// Result of a finished training run
pub struct TrainOutcome<B: Backend> {
    /// Trained weights, dropout disabled
    pub model:   Classifier<B>,
    pub history: Vec<EvalRecord>,
    pub final_report: EvalReport,
    pub steps:   usize,
}

/// Evaluate `model` on every batch of `batches`.
pub fn validate<B: Backend>(
    model:   &Classifier<B>,
    batches: impl Iterator<Item = ImageBatch<B>>,
) -> EvalReport {
    let mut loss_sum = 0.0f64;
    let mut batches_seen = 0usize;
    let mut correct  = 0usize;
    let mut samples  = 0usize;

    for batch in batches {
        samples += batch.targets.dims()[0];

        let (loss, logits) = model.forward_classification(batch.images, batch.targets.clone());
        loss_sum     += loss.into_scalar().elem::<f64>();
        batches_seen += 1;

        // argmax(1) returns shape [batch, 1] — flatten to [batch]
        // before comparing with the targets
        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
        correct += hits as usize;
    }

    EvalReport {
        loss:     if batches_seen > 0 { loss_sum / batches_seen as f64 } else { f64::NAN },
        accuracy: if samples > 0 { correct as f64 / samples as f64 } else { 0.0 },
        batches:  batches_seen,
        samples,
    }
}

/// Train a fresh classifier described by `cfg` on the default backend.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    metrics:       Option<&MetricsLogger>,
) -> Result<TrainOutcome<InnerBackend>> {
    let device = default_device();
    tracing::info!("Using device: {:?}", device);

    TrainBackend::seed(cfg.seed);
    let model: Classifier<TrainBackend> = cfg.model_config().init(&device);
    tracing::info!(
        "Model ready: {} → {:?} → {} ({} parameters, dropout={})",
        model.input_size(),
        model.hidden_sizes(),
        model.output_size(),
        model.num_params(),
        cfg.dropout,
    );

    match cfg.optimizer {
        OptimizerKind::Adam => {
            // m = β1*m + (1-β1)*g        (mean)
            // v = β2*v + (1-β2)*g²       (variance)
            // θ = θ - lr * m / (√v + ε)  (update)
            let optim = AdamConfig::new().with_epsilon(1e-8).init();
            train_loop(cfg, model, optim, train_dataset, val_dataset, metrics, device)
        }
        OptimizerKind::Sgd => {
            // θ = θ - lr * g
            let optim = SgdConfig::new().init();
            train_loop(cfg, model, optim, train_dataset, val_dataset, metrics, device)
        }
    }
}

pub fn train_loop<B, O>(
    cfg:           &TrainConfig,
    mut model:     Classifier<B>,
    mut optim:     O,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    metrics:       Option<&MetricsLogger>,
    device:        B::Device,
) -> Result<TrainOutcome<B::InnerBackend>>
where
    B: AutodiffBackend,
    O: Optimizer<Classifier<B>, B>,
{
    tracing::info!(
        "Training on {} samples, evaluating on {} held-out samples",
        train_dataset.sample_count(),
        val_dataset.sample_count(),
    );

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Held-out data loader (InnerBackend — no autodiff overhead) ────────────
    let val_loader = DataLoaderBuilder::new(ImageBatcher::<B::InnerBackend>::new(device))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut steps         = 0usize;
    let mut running_loss  = 0.0f64;
    let mut best_val_loss = f64::INFINITY;
    let mut history       = Vec::new();

    for epoch in 1..=cfg.epochs {
        for batch in train_loader.iter() {
            steps += 1;

            let (loss, _) = model.forward_classification(batch.images, batch.targets);
            running_loss += loss.clone().into_scalar().elem::<f64>();

            // Backward pass + optimizer update
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);

            if cfg.print_every == 0 || steps % cfg.print_every != 0 {
                continue;
            }

            let report = validate(&model.valid(), val_loader.iter());
            let record = EvalRecord::new(
                epoch,
                steps,
                running_loss / cfg.print_every as f64,
                report.loss,
                report.accuracy,
            );

            tracing::info!(
                "Epoch: {}/{}.. Training Loss: {:.3}.. Test Loss: {:.3}.. Test Accuracy: {:.3}",
                epoch,
                cfg.epochs,
                record.train_loss,
                record.val_loss,
                record.val_accuracy,
            );
            if record.is_improvement(best_val_loss) {
                best_val_loss = record.val_loss;
                tracing::debug!("New best held-out loss {:.4} at step {}", best_val_loss, steps);
            }

            if let Some(logger) = metrics {
                logger.log(&record)?;
            }
            history.push(record);
            running_loss = 0.0;
        }
    }

    // dropout disabled for deterministic evaluation
    let model        = model.valid();
    let final_report = validate(&model, val_loader.iter());
    tracing::info!(
        "Training complete after {} steps: held-out loss {:.3}, accuracy {:.3}",
        steps,
        final_report.loss,
        final_report.accuracy,
    );

    Ok(TrainOutcome { model, history, final_report, steps })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        data::dataloader::batcher::Batcher,
    };

    use crate::domain::image::{ImageSample, IMAGE_PIXELS};
    use crate::ml::model::ClassifierConfig;

    type TestBackend         = NdArray;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    /// Class 0 = blank image, class 1 = fully inked image
    fn two_class_samples(n: usize) -> Vec<ImageSample> {
        (0..n)
            .map(|i| {
                let label = (i % 2) as u8;
                ImageSample::new(vec![label * 255; IMAGE_PIXELS], label)
            })
            .collect()
    }

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            hidden_layers: vec![16],
            dropout:       0.0,
            epochs:        15,
            batch_size:    4,
            lr:            0.005,
            print_every:   5,
            seed:          7,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_validate_counts_correct_predictions() {
        let device = Default::default();
        let mut model = ClassifierConfig::new(IMAGE_PIXELS, 2, vec![])
            .init::<TestBackend>(&device);

        // Zero weights, bias favouring class 1: every prediction is 1
        let weight = Tensor::<TestBackend, 2>::zeros([IMAGE_PIXELS, 2], &device);
        let bias   = Tensor::<TestBackend, 1>::from_data(TensorData::new(vec![0.0f32, 1.0], [2]), &device);
        model.output.weight = burn::module::Param::from_tensor(weight);
        model.output.bias   = Some(burn::module::Param::from_tensor(bias));

        let batcher = ImageBatcher::<TestBackend>::new(device);
        let samples = two_class_samples(6);
        let batches = vec![
            batcher.batch(samples[..4].to_vec()),
            batcher.batch(samples[4..].to_vec()),
        ];

        let report = validate(&model, batches.into_iter());
        assert_eq!(report.batches, 2);
        assert_eq!(report.samples, 6);
        assert!((report.accuracy - 0.5).abs() < 1e-12);
        assert!(report.loss.is_finite());
    }

    #[test]
    fn test_validate_empty_set() {
        let device = Default::default();
        let model  = ClassifierConfig::new(IMAGE_PIXELS, 2, vec![4]).init::<TestBackend>(&device);
        let report = validate(&model, std::iter::empty());
        assert!(report.loss.is_nan());
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.samples, 0);
    }

    #[test]
    fn test_training_learns_separable_classes() {
        let cfg    = tiny_config();
        let device = Default::default();
        let model  = ClassifierConfig::new(IMAGE_PIXELS, 2, cfg.hidden_layers.clone())
            .with_dropout(cfg.dropout)
            .init::<TestAutodiffBackend>(&device);
        let optim  = AdamConfig::new().init();

        let batcher  = ImageBatcher::<TestBackend>::new(device.clone());
        let baseline = validate(
            &model.valid(),
            std::iter::once(batcher.batch(two_class_samples(8))),
        );

        let outcome = train_loop(
            &cfg,
            model,
            optim,
            ImageDataset::new(two_class_samples(16)),
            ImageDataset::new(two_class_samples(8)),
            None,
            device,
        )
        .unwrap();

        // 16 samples / batch 4 = 4 steps per epoch
        assert_eq!(outcome.steps, 60);
        assert_eq!(outcome.history.len(), 12);
        assert_eq!(outcome.final_report.samples, 8);
        assert_eq!(outcome.final_report.accuracy, 1.0);
        assert!(outcome.final_report.loss < baseline.loss);
    }

    #[test]
    fn test_zero_print_every_skips_periodic_evaluation() {
        let cfg = TrainConfig { epochs: 1, print_every: 0, ..tiny_config() };
        let device = Default::default();
        let model  = ClassifierConfig::new(IMAGE_PIXELS, 2, vec![4])
            .init::<TestAutodiffBackend>(&device);

        let outcome = train_loop(
            &cfg,
            model,
            SgdConfig::new().init(),
            ImageDataset::new(two_class_samples(8)),
            ImageDataset::new(two_class_samples(2)),
            None,
            device,
        )
        .unwrap();

        assert_eq!(outcome.steps, 2);
        assert!(outcome.history.is_empty());
    }

    #[test]
    fn test_metrics_rows_average_loss_since_last_evaluation() {
        // lr 0 freezes the weights and every image is identical, so each
        // batch has the same loss and a correct average equals the held-out loss
        let cfg = TrainConfig {
            epochs:      1,
            batch_size:  4,
            print_every: 2,
            lr:          0.0,
            dropout:     0.0,
            ..tiny_config()
        };
        let same   = || vec![ImageSample::new(vec![100; IMAGE_PIXELS], 3); 8];
        let device = Default::default();
        let model  = ClassifierConfig::new(IMAGE_PIXELS, 10, vec![4])
            .init::<TestAutodiffBackend>(&device);

        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();

        let outcome = train_loop(
            &cfg,
            model,
            SgdConfig::new().init(),
            ImageDataset::new(same()),
            ImageDataset::new(same()[..4].to_vec()),
            Some(&logger),
            device,
        )
        .unwrap();

        assert_eq!(outcome.history.len(), 1);
        let record = &outcome.history[0];
        assert_eq!((record.epoch, record.step), (1, 2));
        assert!(
            (record.train_loss - record.val_loss).abs() < 1e-4,
            "train {} vs held-out {}",
            record.train_loss,
            record.val_loss
        );

        let csv  = std::fs::read_to_string(logger.csv_path()).unwrap();
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("1,2,"));
        let train_loss: f64 = rows[0].split(',').nth(2).unwrap().parse().unwrap();
        assert!((train_loss - record.train_loss).abs() < 1e-5);
    }

    #[test]
    fn test_parse_optimizer_kind() {
        assert_eq!("Adam".parse::<OptimizerKind>(), Ok(OptimizerKind::Adam));
        assert_eq!(OptimizerKind::Sgd.to_string(), "sgd");
        assert!("rmsprop".parse::<OptimizerKind>().is_err());
    }
}
