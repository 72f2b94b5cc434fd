// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Describes a saved checkpoint without loading any dataset:
// the recorded architecture, every state dict key with its
// shape, and the total parameter count. When the directory
// also holds train_config.json, the run's settings follow.

use anyhow::Result;

use crate::application::train_use_case::TrainConfig;
use crate::infra::checkpoint::{Checkpoint, CheckpointManager};

pub struct InspectUseCase {
    pub checkpoint_dir: String,
}

impl InspectUseCase {
    pub fn execute(&self) -> Result<String> {
        let manager = CheckpointManager::open(&self.checkpoint_dir);
        let mut out = describe(&manager.load_checkpoint()?);

        if manager.config_path().is_file() {
            out.push_str(&describe_run(&manager.load_config()?));
        }
        Ok(out)
    }
}

pub fn describe(ckpt: &Checkpoint) -> String {
    let mut out = String::new();
    out.push_str(&format!("input_size:    {}\n", ckpt.input_size));
    out.push_str(&format!("output_size:   {}\n", ckpt.output_size));
    out.push_str(&format!("hidden_layers: {:?}\n", ckpt.hidden_layers));
    out.push_str("state_dict:\n");
    for (name, tensor) in ckpt.state_dict.iter() {
        out.push_str(&format!("  {name:<24} {:?}\n", tensor.shape));
    }
    out.push_str(&format!("parameters:    {}\n", ckpt.num_params()));
    out
}

fn describe_run(cfg: &TrainConfig) -> String {
    format!(
        "trained on:    {} ({} epochs, batch {}, {} lr={}, dropout={}, seed={})\n",
        cfg.dataset, cfg.epochs, cfg.batch_size, cfg.optimizer, cfg.lr, cfg.dropout, cfg.seed
    )
}
