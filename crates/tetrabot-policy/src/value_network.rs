use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tetrabot_harness::{DecisionPolicy, StateVector, argmax};

use crate::activation::Activation;

/// Serialized form of a value network.
///
/// ```json
/// {
///   "name": "dqn-4-64-64-1",
///   "state_size": 4,
///   "layers": [
///     { "weights": [[...], ...], "biases": [...], "activation": "relu" },
///     { "weights": [[...]], "biases": [0.1] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueNetworkModel {
    pub name: String,
    pub state_size: usize,
    pub layers: Vec<DenseLayer>,
}

/// Fully connected layer; `weights` holds one row of input weights per output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| {
                let z = bias + row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>();
                self.activation.apply(z)
            })
            .collect()
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ModelLoadError {
    #[display("failed to open model file {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("failed to parse model file {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("model has no layers")]
    NoLayers,
    #[display("model expects {found} inputs but the environment produces {expected}")]
    InputWidth { expected: usize, found: usize },
    #[display("layer {layer} has a weight row of width {found}, expected {expected}")]
    ShapeMismatch {
        layer: usize,
        expected: usize,
        found: usize,
    },
    #[display("layer {layer} has {found} biases for {expected} outputs")]
    BiasMismatch {
        layer: usize,
        expected: usize,
        found: usize,
    },
    #[display("model must produce a single value, got {found} outputs")]
    OutputWidth { found: usize },
}

/// Greedy value-network policy.
///
/// Scores every candidate state and keeps the first one with the highest
/// value. There is no exploration.
#[derive(Debug, Clone)]
pub struct ValueNetwork {
    model: ValueNetworkModel,
}

impl ValueNetwork {
    /// Reads and validates a model file for an environment producing
    /// `state_size`-wide state vectors.
    pub fn load<P>(path: P, state_size: usize) -> Result<Self, ModelLoadError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelLoadError::Open {
            path: path.to_owned(),
            source,
        })?;
        let model: ValueNetworkModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ModelLoadError::Parse {
                path: path.to_owned(),
                source,
            })?;
        let network = Self::from_model(model, state_size)?;
        tracing::info!(
            path = %path.display(),
            name = network.name(),
            layers = network.model.layers.len(),
            "loaded value network"
        );
        Ok(network)
    }

    /// Validates `model` for `state_size`-wide inputs.
    pub fn from_model(model: ValueNetworkModel, state_size: usize) -> Result<Self, ModelLoadError> {
        if model.layers.is_empty() {
            return Err(ModelLoadError::NoLayers);
        }
        if model.state_size != state_size {
            return Err(ModelLoadError::InputWidth {
                expected: state_size,
                found: model.state_size,
            });
        }

        let mut width = model.state_size;
        for (layer, dense) in model.layers.iter().enumerate() {
            if let Some(row) = dense.weights.iter().find(|row| row.len() != width) {
                return Err(ModelLoadError::ShapeMismatch {
                    layer,
                    expected: width,
                    found: row.len(),
                });
            }
            if dense.biases.len() != dense.weights.len() {
                return Err(ModelLoadError::BiasMismatch {
                    layer,
                    expected: dense.weights.len(),
                    found: dense.biases.len(),
                });
            }
            width = dense.weights.len();
        }
        if width != 1 {
            return Err(ModelLoadError::OutputWidth { found: width });
        }

        Ok(Self { model })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.model.name
    }

    #[must_use]
    pub fn state_size(&self) -> usize {
        self.model.state_size
    }

    #[must_use]
    pub fn model(&self) -> &ValueNetworkModel {
        &self.model
    }

    /// Estimated value of one state.
    #[must_use]
    pub fn score(&self, state: &[f32]) -> f32 {
        let mut activations = state.to_vec();
        for layer in &self.model.layers {
            activations = layer.forward(&activations);
        }
        activations[0]
    }

    /// Scores every state, in order.
    #[must_use]
    pub fn score_batch(&self, states: &[StateVector]) -> Vec<f32> {
        states.iter().map(|state| self.score(state)).collect()
    }
}

impl DecisionPolicy for ValueNetwork {
    fn select_best(&self, states: &[StateVector]) -> StateVector {
        let best = argmax(self.score_batch(states)).unwrap_or(0);
        states[best].clone()
    }
}
