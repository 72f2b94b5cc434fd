// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Restores a checkpoint and measures it on the test split.

use anyhow::Result;

use crate::data::loader::IdxLoader;
use crate::domain::dataset_kind::{DatasetKind, Split};
use crate::domain::traits::ImageSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;
use crate::ml::trainer::EvalReport;
use crate::ml::{default_device, InnerBackend};

pub struct EvaluateUseCase {
    pub checkpoint_dir: String,
    pub data_dir:       String,
    pub dataset:        DatasetKind,
    pub batch_size:     usize,
    pub limit:          Option<usize>,
}

impl EvaluateUseCase {
    pub fn execute(&self) -> Result<EvalReport> {
        let ckpt       = CheckpointManager::open(&self.checkpoint_dir);
        let inferencer = Inferencer::<InnerBackend>::from_checkpoint(&ckpt, self.dataset, default_device())?;

        let samples = IdxLoader::new(&self.data_dir, self.dataset)
            .with_limit(self.limit)
            .load_split(Split::Test)?;

        let report = inferencer.evaluate(&samples, self.batch_size);
        tracing::info!(
            "Evaluated {} samples: loss {:.3}, accuracy {:.3}",
            report.samples,
            report.loss,
            report.accuracy
        );
        Ok(report)
    }
}
