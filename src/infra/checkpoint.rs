// ============================================================
// Layer 6 — Checkpoints
// ============================================================
// A checkpoint is everything needed to rebuild a trained model:
//
//   input_size     — features per input row
//   output_size    — number of classes
//   hidden_layers  — hidden widths, in order
//   state_dict     — parameter name → tensor
//
// On disk it is a single .safetensors file. The state dict is
// stored as the file's f32 tensors; the three architecture
// fields live in the `__metadata__` string map:
//
//   { "input_size": "784", "output_size": "10",
//     "hidden_layers": "[512,256,128]" }
//
// Loading rebuilds a network with the recorded widths and then
// assigns the state dict to it, so a file always restores into
// the architecture it was saved from.
//
// Files managed in a checkpoint directory:
//   checkpoints/
//     checkpoint.safetensors   ← architecture + weights
//     train_config.json        ← hyperparameters of the run
//     metrics.csv              ← periodic evaluation log
//
// Reference: safetensors file format (huggingface/safetensors)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use burn::prelude::*;
use safetensors::{serialize_to_file, tensor::TensorView, Dtype, SafeTensorError, SafeTensors};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{Classifier, ClassifierConfig};
use crate::ml::state_dict::{ParamTensor, StateDict, StateDictError};

pub const CHECKPOINT_FILE: &str = "checkpoint.safetensors";
pub const CONFIG_FILE: &str     = "train_config.json";

const INPUT_SIZE_KEY: &str    = "input_size";
const OUTPUT_SIZE_KEY: &str   = "output_size";
const HIDDEN_LAYERS_KEY: &str = "hidden_layers";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("cannot access checkpoint '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid safetensors data: {0}")]
    Format(#[from] SafeTensorError),

    #[error("checkpoint metadata has no `{0}` entry")]
    MissingMetadata(&'static str),

    #[error("checkpoint metadata `{key}` is malformed: '{value}'")]
    MalformedMetadata { key: &'static str, value: String },

    #[error("tensor `{name}` is stored as {dtype}, only F32 is supported")]
    UnsupportedDtype { name: String, dtype: String },

    #[error(transparent)]
    StateDict(#[from] StateDictError),
}

// ─── Checkpoint ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub input_size:    usize,
    pub output_size:   usize,
    pub hidden_layers: Vec<usize>,
    pub state_dict:    StateDict,
}

impl Checkpoint {
    /// Snapshot a model's architecture and parameters
    pub fn from_model<B: Backend>(model: &Classifier<B>) -> Result<Self, CheckpointError> {
        let config = model.config();
        Ok(Self {
            input_size:    config.input_size,
            output_size:   config.output_size,
            hidden_layers: config.hidden_layers,
            state_dict:    model.state_dict()?,
        })
    }

    /// Architecture recorded in this checkpoint
    pub fn model_config(&self) -> ClassifierConfig {
        ClassifierConfig::new(self.input_size, self.output_size, self.hidden_layers.clone())
    }

    /// Rebuild the recorded architecture and load the parameters into it
    pub fn into_model<B: Backend>(self, device: &B::Device) -> Result<Classifier<B>, CheckpointError> {
        let model = self.model_config().init::<B>(device);
        Ok(model.load_state_dict(&self.state_dict)?)
    }

    pub fn num_params(&self) -> usize {
        self.state_dict.num_params()
    }

    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        // Tensor bytes must outlive the views that borrow them
        let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = self
            .state_dict
            .iter()
            .map(|(name, t)| {
                let mut bytes = vec![0u8; t.values.len() * 4];
                LittleEndian::write_f32_into(&t.values, &mut bytes);
                (name.clone(), t.shape.clone(), bytes)
            })
            .collect();

        let views = buffers
            .iter()
            .map(|(name, shape, bytes)| {
                Ok((name.clone(), TensorView::new(Dtype::F32, shape.clone(), bytes)?))
            })
            .collect::<Result<BTreeMap<String, TensorView>, SafeTensorError>>()?;

        let hidden = serde_json::to_string(&self.hidden_layers).map_err(|e| {
            CheckpointError::MalformedMetadata { key: HIDDEN_LAYERS_KEY, value: e.to_string() }
        })?;
        let metadata = HashMap::from([
            (INPUT_SIZE_KEY.to_string(), self.input_size.to_string()),
            (OUTPUT_SIZE_KEY.to_string(), self.output_size.to_string()),
            (HIDDEN_LAYERS_KEY.to_string(), hidden),
        ]);

        serialize_to_file(&views, &Some(metadata), path)?;
        tracing::debug!("Wrote {} tensors to '{}'", views.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let bytes = fs::read(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (_, header) = SafeTensors::read_metadata(&bytes)?;
        let metadata    = header.metadata().clone().unwrap_or_default();

        let input_size    = parse_metadata::<usize>(&metadata, INPUT_SIZE_KEY)?;
        let output_size   = parse_metadata::<usize>(&metadata, OUTPUT_SIZE_KEY)?;
        let hidden_layers = parse_metadata::<Vec<usize>>(&metadata, HIDDEN_LAYERS_KEY)?;

        let tensors    = SafeTensors::deserialize(&bytes)?;
        let state_dict = tensors
            .tensors()
            .into_iter()
            .map(|(name, view)| {
                if view.dtype() != Dtype::F32 {
                    return Err(CheckpointError::UnsupportedDtype {
                        dtype: format!("{:?}", view.dtype()),
                        name,
                    });
                }
                let mut values = vec![0f32; view.data().len() / 4];
                LittleEndian::read_f32_into(view.data(), &mut values);
                Ok((name, ParamTensor::new(view.shape().to_vec(), values)))
            })
            .collect::<Result<StateDict, CheckpointError>>()?;

        Ok(Self { input_size, output_size, hidden_layers, state_dict })
    }
}

/// Metadata values are JSON literals: `784` or `[512,256]`
fn parse_metadata<T: serde::de::DeserializeOwned>(
    metadata: &HashMap<String, String>,
    key:      &'static str,
) -> Result<T, CheckpointError> {
    let value = metadata.get(key).ok_or(CheckpointError::MissingMetadata(key))?;
    serde_json::from_str(value).map_err(|_| CheckpointError::MalformedMetadata {
        key,
        value: value.clone(),
    })
}

// ─── CheckpointManager ────────────────────────────────────────────────────────
/// Manages the files of one checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn save_model<B: Backend>(&self, model: &Classifier<B>) -> Result<PathBuf> {
        let path = self.checkpoint_path();
        Checkpoint::from_model(model)
            .and_then(|ckpt| ckpt.save(&path))
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::info!("Saved checkpoint to '{}'", path.display());
        Ok(path)
    }

    pub fn load_checkpoint(&self) -> Result<Checkpoint> {
        let path = self.checkpoint_path();
        Checkpoint::load(&path).with_context(|| {
            format!(
                "Cannot load checkpoint '{}'. Have you trained the model first?",
                path.display()
            )
        })
    }

    /// Rebuild the saved model on `device`
    pub fn load_model<B: Backend>(&self, device: &B::Device) -> Result<Classifier<B>> {
        let ckpt = self.load_checkpoint()?;
        Ok(ckpt.into_model::<B>(device)?)
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.config_path();
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}
