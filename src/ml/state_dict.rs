// ============================================================
// Layer 5 — State Dict
// ============================================================
// A state dict maps every parameter name of a Classifier to a
// host-side copy of its value:
//
//   hidden_layers.0.weight   [784, 512]
//   hidden_layers.0.bias     [512]
//   ...
//   output.weight            [128, 10]
//   output.bias              [10]
//
// Burn stores linear weights as [d_input, d_output].
//
// Loading is shape-checked. Every incompatible tensor (shape
// mismatch, missing key, unexpected key) is collected and
// reported at once, and nothing is assigned unless all tensors
// fit the target network.

use std::{collections::BTreeMap, fmt};

use burn::{
    module::Param,
    nn::Linear,
    prelude::*,
};
use thiserror::Error;

use crate::ml::model::Classifier;

// ─── ParamTensor ──────────────────────────────────────────────────────────────
/// One parameter: its shape and row-major f32 values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamTensor {
    pub shape:  Vec<usize>,
    pub values: Vec<f32>,
}

impl ParamTensor {
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Self {
        Self { shape, values }
    }

    fn from_tensor<B: Backend, const D: usize>(
        name:   &str,
        tensor: Tensor<B, D>,
    ) -> Result<Self, StateDictError> {
        let data   = tensor.into_data().convert::<f32>();
        let shape  = data.shape.clone();
        let values = data.to_vec::<f32>().map_err(|e| StateDictError::Tensor {
            name:   name.to_string(),
            reason: format!("{e:?}"),
        })?;
        Ok(Self { shape, values })
    }

    fn to_tensor<B: Backend, const D: usize>(&self, device: &B::Device) -> Tensor<B, D> {
        Tensor::from_data(
            TensorData::new(self.values.clone(), self.shape.clone()),
            device,
        )
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

// ─── StateDict ────────────────────────────────────────────────────────────────
/// Parameter name → value, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDict {
    tensors: BTreeMap<String, ParamTensor>,
}

impl StateDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: ParamTensor) {
        self.tensors.insert(name.into(), tensor);
    }

    pub fn get(&self, name: &str) -> Option<&ParamTensor> {
        self.tensors.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamTensor)> {
        self.tensors.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.tensors.keys()
    }

    /// Total number of scalar parameters
    pub fn num_params(&self) -> usize {
        self.tensors.values().map(ParamTensor::numel).sum()
    }

    /// Compare against the shapes a network expects
    pub fn check_against(
        &self,
        expected: &BTreeMap<String, Vec<usize>>,
    ) -> Result<(), Incompatibility> {
        let mut report = Incompatibility::default();

        for (name, shape) in expected {
            match self.tensors.get(name) {
                None => report.missing.push(name.clone()),
                Some(t) if &t.shape != shape => report.mismatches.push(ShapeMismatch {
                    name:             name.clone(),
                    checkpoint_shape: t.shape.clone(),
                    model_shape:      shape.clone(),
                }),
                Some(_) => {}
            }
        }
        report.unexpected = self
            .keys()
            .filter(|k| !expected.contains_key(*k))
            .cloned()
            .collect();

        if report.is_empty() { Ok(()) } else { Err(report) }
    }
}

impl FromIterator<(String, ParamTensor)> for StateDict {
    fn from_iter<I: IntoIterator<Item = (String, ParamTensor)>>(iter: I) -> Self {
        Self { tensors: iter.into_iter().collect() }
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub name:             String,
    pub checkpoint_shape: Vec<usize>,
    pub model_shape:      Vec<usize>,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size mismatch for {}: copying a param with shape {:?} from checkpoint, \
             the shape in current model is {:?}.",
            self.name, self.checkpoint_shape, self.model_shape
        )
    }
}

/// Everything that prevents a state dict from loading into a network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Incompatibility {
    pub mismatches: Vec<ShapeMismatch>,
    pub missing:    Vec<String>,
    pub unexpected: Vec<String>,
}

impl Incompatibility {
    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty() && self.missing.is_empty() && self.unexpected.is_empty()
    }
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.missing.is_empty() {
            writeln!(f, "\tMissing key(s) in state dict: {}.", self.missing.join(", "))?;
        }
        if !self.unexpected.is_empty() {
            writeln!(f, "\tUnexpected key(s) in state dict: {}.", self.unexpected.join(", "))?;
        }
        for m in &self.mismatches {
            writeln!(f, "\t{m}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum StateDictError {
    #[error("Error(s) in loading state dict for Classifier:\n{0}")]
    Incompatible(Incompatibility),

    #[error("cannot read tensor `{name}`: {reason}")]
    Tensor { name: String, reason: String },
}

// ─── Classifier <-> StateDict ─────────────────────────────────────────────────
impl<B: Backend> Classifier<B> {
    /// Copy every parameter to host memory
    pub fn state_dict(&self) -> Result<StateDict, StateDictError> {
        let mut dict = StateDict::new();
        for (i, layer) in self.hidden_layers.iter().enumerate() {
            insert_linear(&mut dict, &format!("hidden_layers.{i}"), layer)?;
        }
        insert_linear(&mut dict, "output", &self.output)?;
        Ok(dict)
    }

    /// Parameter name → shape for this network
    pub fn parameter_shapes(&self) -> BTreeMap<String, Vec<usize>> {
        let mut shapes = BTreeMap::new();
        for (i, layer) in self.hidden_layers.iter().enumerate() {
            linear_shapes(&mut shapes, &format!("hidden_layers.{i}"), layer);
        }
        linear_shapes(&mut shapes, "output", &self.output);
        shapes
    }

    /// Replace every parameter with the matching state dict entry.
    ///
    /// Fails without touching the network when any key is missing,
    /// unexpected, or has a different shape.
    pub fn load_state_dict(mut self, dict: &StateDict) -> Result<Self, StateDictError> {
        dict.check_against(&self.parameter_shapes())
            .map_err(StateDictError::Incompatible)?;

        let device = self.output.weight.val().device();
        for (i, layer) in self.hidden_layers.iter_mut().enumerate() {
            assign_linear(layer, &format!("hidden_layers.{i}"), dict, &device);
        }
        assign_linear(&mut self.output, "output", dict, &device);

        tracing::debug!("Loaded {} parameters into classifier", dict.num_params());
        Ok(self)
    }
}

fn insert_linear<B: Backend>(
    dict:   &mut StateDict,
    prefix: &str,
    layer:  &Linear<B>,
) -> Result<(), StateDictError> {
    let name = format!("{prefix}.weight");
    let weight = ParamTensor::from_tensor(&name, layer.weight.val())?;
    dict.insert(name, weight);

    if let Some(bias) = &layer.bias {
        let name = format!("{prefix}.bias");
        let bias = ParamTensor::from_tensor(&name, bias.val())?;
        dict.insert(name, bias);
    }
    Ok(())
}

fn linear_shapes<B: Backend>(
    shapes: &mut BTreeMap<String, Vec<usize>>,
    prefix: &str,
    layer:  &Linear<B>,
) {
    shapes.insert(format!("{prefix}.weight"), layer.weight.val().dims().to_vec());
    if let Some(bias) = &layer.bias {
        shapes.insert(format!("{prefix}.bias"), bias.val().dims().to_vec());
    }
}

// Only called after check_against succeeded, so every key is present.
fn assign_linear<B: Backend>(
    layer:  &mut Linear<B>,
    prefix: &str,
    dict:   &StateDict,
    device: &B::Device,
) {
    if let Some(w) = dict.get(&format!("{prefix}.weight")) {
        layer.weight = Param::from_tensor(w.to_tensor::<B, 2>(device));
    }
    if let Some(b) = dict.get(&format!("{prefix}.bias")) {
        layer.bias = Some(Param::from_tensor(b.to_tensor::<B, 1>(device)));
    }
}
