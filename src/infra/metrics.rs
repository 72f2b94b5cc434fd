// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records every periodic held-out evaluation to a CSV file.
//
// Columns:
//   - epoch:        epoch the evaluation happened in (starts at 1)
//   - step:         number of optimizer steps taken so far
//   - train_loss:   mean training loss since the previous evaluation
//   - val_loss:     mean cross-entropy loss on the held-out set
//   - val_accuracy: fraction of held-out images classified correctly
//
// Output file: checkpoints/metrics.csv
//
// Example CSV output:
//   epoch,step,train_loss,val_loss,val_accuracy
//   1,40,1.284500,0.689200,0.751000
//   1,80,0.790100,0.574300,0.792000
//   ...

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

pub const METRICS_FILE: &str = "metrics.csv";

/// One periodic evaluation of the model during training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    pub epoch:        usize,
    pub step:         usize,
    pub train_loss:   f64,
    pub val_loss:     f64,
    pub val_accuracy: f64,
}

impl EvalRecord {
    pub fn new(
        epoch:        usize,
        step:         usize,
        train_loss:   f64,
        val_loss:     f64,
        val_accuracy: f64,
    ) -> Self {
        Self { epoch, step, train_loss, val_loss, val_accuracy }
    }

    /// Returns true if this evaluation beat the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Appends evaluation records to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join(METRICS_FILE);

        // Appending across runs keeps earlier rows
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,step,train_loss,val_loss,val_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EvalRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6}",
            m.epoch,
            m.step,
            m.train_loss,
            m.val_loss,
            m.val_accuracy,
        )?;

        tracing::debug!(
            "Logged step {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.step,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EvalRecord::new(2, 80, 2.5, 2.3, 0.2);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_log_appends_rows_after_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EvalRecord::new(1, 40, 1.0, 0.5, 0.75)).unwrap();
        logger.log(&EvalRecord::new(1, 80, 0.8, 0.4, 0.8)).unwrap();

        // A second logger on the same directory keeps the existing rows
        MetricsLogger::new(dir.path()).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,step,train_loss,val_loss,val_accuracy");
        assert_eq!(lines[1], "1,40,1.000000,0.500000,0.750000");
    }
}
