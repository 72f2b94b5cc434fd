// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the training split        (Layer 4 - data)
//   Step 2: Choose the held-out set        (Layer 4 - data)
//   Step 3: Build Burn datasets            (Layer 4 - data)
//   Step 4: Save config + open metrics log (Layer 6 - infra)
//   Step 5: Run training loop              (Layer 5 - ml)
//   Step 6: Save checkpoint                (Layer 6 - infra)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::ImageDataset,
    loader::IdxLoader,
    splitter::split_train_val,
};
use crate::domain::dataset_kind::{DatasetKind, Split};
use crate::domain::image::IMAGE_PIXELS;
use crate::domain::traits::ImageSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::model::ClassifierConfig;
use crate::ml::trainer::{run_training, EvalReport, OptimizerKind};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoint so a run can be reproduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub dataset:        DatasetKind,
    pub checkpoint_dir: String,
    pub hidden_layers:  Vec<usize>,
    pub dropout:        f64,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
    pub optimizer:      OptimizerKind,
    /// Evaluate on the held-out set every N optimizer steps, 0 = only at the end
    pub print_every:    usize,
    /// Hold out part of the training split instead of using the test split
    pub val_fraction:   Option<f64>,
    /// Keep only the first N samples of each split
    pub limit:          Option<usize>,
    pub seed:           u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data/mnist".to_string(),
            dataset:        DatasetKind::Mnist,
            checkpoint_dir: "checkpoints".to_string(),
            hidden_layers:  vec![512, 256, 128],
            dropout:        0.5,
            epochs:         2,
            batch_size:     64,
            lr:             0.001,
            optimizer:      OptimizerKind::Adam,
            print_every:    40,
            val_fraction:   None,
            limit:          None,
            seed:           42,
        }
    }
}

impl TrainConfig {
    /// Network described by this run
    pub fn model_config(&self) -> ClassifierConfig {
        ClassifierConfig::new(IMAGE_PIXELS, self.dataset.num_classes(), self.hidden_layers.clone())
            .with_dropout(self.dropout)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        ensure!(
            (0.0..1.0).contains(&self.dropout),
            "dropout must be in [0, 1), got {}",
            self.dropout
        );
        ensure!(self.lr > 0.0, "learning rate must be positive, got {}", self.lr);
        if let Some(f) = self.val_fraction {
            ensure!(f > 0.0 && f < 1.0, "validation fraction must be in (0, 1), got {f}");
        }
        ensure!(
            self.hidden_layers.iter().all(|&w| w > 0),
            "hidden layer widths must be positive, got {:?}",
            self.hidden_layers
        );
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<EvalReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load the training split ───────────────────────────────────
        let loader  = IdxLoader::new(&cfg.data_dir, cfg.dataset).with_limit(cfg.limit);
        let samples = loader.load_split(Split::Train)?;

        // ── Step 2: Choose the held-out set ───────────────────────────────────
        // Either a seeded slice of the training split, or the test split
        let (train_samples, val_samples) = match cfg.val_fraction {
            Some(fraction) => split_train_val(samples, 1.0 - fraction, cfg.seed),
            None           => (samples, loader.load_split(Split::Test)?),
        };
        tracing::info!(
            "Split: {} train, {} held-out",
            train_samples.len(),
            val_samples.len()
        );
        if val_samples.is_empty() {
            tracing::warn!("Held-out set is empty, reported losses will be NaN");
        }

        // ── Step 3: Build Burn datasets ───────────────────────────────────────
        let train_dataset = ImageDataset::new(train_samples);
        let val_dataset   = ImageDataset::new(val_samples);

        // ── Step 4: Save config, open metrics log ─────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(ckpt_manager.dir())?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        let outcome = run_training(cfg, train_dataset, val_dataset, Some(&metrics))?;

        // ── Step 6: Save checkpoint ───────────────────────────────────────────
        ckpt_manager.save_model(&outcome.model)?;
        tracing::info!(
            "{} evaluations written to '{}'",
            outcome.history.len(),
            metrics.csv_path().display()
        );

        Ok(outcome.final_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    use crate::application::{
        evaluate_use_case::EvaluateUseCase,
        inspect_use_case::InspectUseCase,
        predict_use_case::PredictUseCase,
    };
    use crate::data::loader::fixtures::{striped_samples, write_split};
    use crate::infra::{checkpoint::{CHECKPOINT_FILE, CONFIG_FILE}, metrics::METRICS_FILE};

    fn tiny_run(data: &Path, ckpt: &Path) -> TrainConfig {
        TrainConfig {
            data_dir:       data.display().to_string(),
            checkpoint_dir: ckpt.display().to_string(),
            hidden_layers:  vec![8],
            dropout:        0.0,
            epochs:         1,
            batch_size:     4,
            print_every:    1,
            ..TrainConfig::default()
        }
    }

    /// Data rows of metrics.csv, split into columns
    fn metric_rows(ckpt: &Path) -> Vec<Vec<String>> {
        let csv = fs::read_to_string(ckpt.join(METRICS_FILE)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("epoch,step,train_loss,val_loss,val_accuracy"));
        lines.map(|l| l.split(',').map(str::to_string).collect()).collect()
    }

    #[test]
    fn test_train_then_evaluate_predict_inspect() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        write_split(data.path(), Split::Train, &striped_samples(12));
        write_split(data.path(), Split::Test, &striped_samples(6));

        let cfg    = TrainConfig { limit: Some(8), ..tiny_run(data.path(), ckpt.path()) };
        let report = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(report.samples, 6);

        for file in [CHECKPOINT_FILE, CONFIG_FILE, METRICS_FILE] {
            assert!(ckpt.path().join(file).is_file(), "{file} not written");
        }

        // 8 training images / batch 4 = 2 steps, one evaluation per step
        let rows = metric_rows(ckpt.path());
        assert_eq!(rows.len(), 2);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row[0], "1");
            assert_eq!(row[1], (i + 1).to_string());
            let train_loss: f64 = row[2].parse().unwrap();
            let accuracy:   f64 = row[4].parse().unwrap();
            assert!(train_loss.is_finite() && train_loss > 0.0);
            assert!((0.0..=1.0).contains(&accuracy));
        }

        let ckpt_dir = ckpt.path().display().to_string();
        let data_dir = data.path().display().to_string();

        let evaluated = EvaluateUseCase {
            checkpoint_dir: ckpt_dir.clone(),
            data_dir:       data_dir.clone(),
            dataset:        DatasetKind::Mnist,
            batch_size:     4,
            limit:          None,
        }
        .execute()
        .unwrap();
        assert_eq!(evaluated.samples, 6);
        assert!((evaluated.accuracy - report.accuracy).abs() < 1e-9);

        let predicted = PredictUseCase {
            checkpoint_dir: ckpt_dir.clone(),
            data_dir,
            dataset:        DatasetKind::Mnist,
            index:          5,
            top_k:          10,
        }
        .execute()
        .unwrap();
        assert_eq!(predicted.true_class, "5");
        assert_eq!(predicted.predictions.len(), 10);
        let total: f32 = predicted.predictions.iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-4);

        let inspected = InspectUseCase { checkpoint_dir: ckpt_dir }.execute().unwrap();
        assert!(inspected.contains("hidden_layers: [8]"));
        // 784*8 + 8 + 8*10 + 10
        assert!(inspected.contains("parameters:    6370"));
        assert!(inspected.contains("trained on:    mnist (1 epochs"));
    }

    #[test]
    fn test_val_fraction_holds_out_part_of_the_training_split() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        // No test split on disk: the held-out set must come from train
        write_split(data.path(), Split::Train, &striped_samples(10));

        let cfg    = TrainConfig { val_fraction: Some(0.2), ..tiny_run(data.path(), ckpt.path()) };
        let report = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(report.samples, 2);
        assert_eq!(metric_rows(ckpt.path()).len(), 2);

        let saved = CheckpointManager::open(ckpt.path()).load_config().unwrap();
        assert_eq!(saved.val_fraction, Some(0.2));
    }

    #[test]
    fn test_missing_test_split_fails_without_val_fraction() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        write_split(data.path(), Split::Train, &striped_samples(4));

        let err = TrainUseCase::new(tiny_run(data.path(), ckpt.path())).execute().unwrap_err();
        assert!(err.to_string().contains("t10k-images-idx3-ubyte"), "{err}");
        assert!(!ckpt.path().join(CHECKPOINT_FILE).exists());
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = TrainConfig::default();
        assert!(cfg.validate().is_ok());

        let model = cfg.model_config();
        assert_eq!(model.input_size, IMAGE_PIXELS);
        assert_eq!(model.output_size, 10);
        assert_eq!(model.hidden_layers, vec![512, 256, 128]);
        assert_eq!(model.dropout, 0.5);
    }

    #[test]
    fn test_rejects_bad_hyperparameters() {
        let base = TrainConfig::default();
        assert!(TrainConfig { batch_size: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { dropout: 1.0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { lr: 0.0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { val_fraction: Some(1.0), ..base.clone() }.validate().is_err());
        assert!(TrainConfig { hidden_layers: vec![64, 0], ..base }.validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg  = TrainConfig { dataset: DatasetKind::FashionMnist, val_fraction: Some(0.1), ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"fashion-mnist\""));
        assert!(json.contains("\"adam\""));

        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dataset, DatasetKind::FashionMnist);
        assert_eq!(back.val_fraction, Some(0.1));
    }
}
