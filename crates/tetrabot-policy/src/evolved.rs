use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tetrabot_harness::{DecisionPolicy, StateVector, argmax};

use crate::activation::NodeActivation;

/// Identifier of a network node.
///
/// Inputs use `-1, -2, ..`, outputs `0..num_outputs`, hidden nodes any other
/// non-negative key.
pub type NodeKey = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGene {
    pub key: NodeKey,
    pub bias: f32,
    pub response: f32,
    #[serde(default)]
    pub activation: NodeActivation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    pub input: NodeKey,
    pub output: NodeKey,
    pub weight: f32,
    pub enabled: bool,
}

/// Genes describing a feed-forward network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkGenome {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub nodes: Vec<NodeGene>,
    pub connections: Vec<ConnectionGene>,
}

impl NetworkGenome {
    /// Builds a genome with one hidden layer: every input feeds every hidden
    /// node, every hidden node feeds the single output.
    ///
    /// All weights and biases start at zero and all responses at one.
    ///
    /// ```
    /// use tetrabot_policy::{NetworkGenome, NodeActivation};
    ///
    /// let genome = NetworkGenome::layered(4, 3, NodeActivation::Sigmoid);
    /// assert_eq!(genome.nodes.len(), 1 + 3);
    /// assert_eq!(genome.connections.len(), 4 * 3 + 3);
    /// assert_eq!(genome.parameter_count(), 4 * 3 + 3 + 1 + 3);
    /// ```
    #[must_use]
    pub fn layered(num_inputs: usize, hidden: usize, activation: NodeActivation) -> Self {
        let node = |key| NodeGene {
            key,
            bias: 0.0,
            response: 1.0,
            activation,
        };
        let inputs = (1..=num_inputs).map(|i| -key_of(i));
        let hidden_keys: Vec<NodeKey> = (1..=hidden).map(key_of).collect();

        let mut nodes = vec![node(0)];
        nodes.extend(hidden_keys.iter().copied().map(node));

        let mut connections = vec![];
        for input in inputs {
            for &output in &hidden_keys {
                connections.push(ConnectionGene {
                    input,
                    output,
                    weight: 0.0,
                    enabled: true,
                });
            }
        }
        for &input in &hidden_keys {
            connections.push(ConnectionGene {
                input,
                output: 0,
                weight: 0.0,
                enabled: true,
            });
        }

        Self {
            num_inputs,
            num_outputs: 1,
            nodes,
            connections,
        }
    }

    /// Number of values returned by [`Self::parameters`].
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.connections.len() + self.nodes.len()
    }

    /// Connection weights followed by node biases, in gene order.
    #[must_use]
    pub fn parameters(&self) -> Vec<f32> {
        self.connections
            .iter()
            .map(|c| c.weight)
            .chain(self.nodes.iter().map(|n| n.bias))
            .collect()
    }

    /// Inverse of [`Self::parameters`].
    ///
    /// # Panics
    ///
    /// Panics if `params` does not hold [`Self::parameter_count`] values.
    pub fn set_parameters(&mut self, params: &[f32]) {
        assert_eq!(params.len(), self.parameter_count(), "parameter count mismatch");
        let (weights, biases) = params.split_at(self.connections.len());
        for (connection, &weight) in self.connections.iter_mut().zip(weights) {
            connection.weight = weight;
        }
        for (node, &bias) in self.nodes.iter_mut().zip(biases) {
            node.bias = bias;
        }
    }
}

fn key_of(index: usize) -> NodeKey {
    NodeKey::try_from(index).unwrap_or(NodeKey::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum NetworkBuildError {
    #[display("node {key} is defined twice")]
    DuplicateNode { key: NodeKey },
    #[display("node {key} uses a key reserved for inputs")]
    ReservedKey { key: NodeKey },
    #[display("output node {key} is missing")]
    MissingOutput { key: NodeKey },
    #[display("connection {input} -> {output} refers to an unknown node")]
    UnknownNode { input: NodeKey, output: NodeKey },
    #[display("connection {input} -> {output} feeds an input node")]
    IntoInput { input: NodeKey, output: NodeKey },
    #[display("enabled connections form a cycle")]
    Cyclic,
}

#[derive(Debug, Clone)]
struct NodeEval {
    slot: usize,
    bias: f32,
    response: f32,
    activation: NodeActivation,
    links: Vec<(usize, f32)>,
}

/// Feed-forward network decoded from a [`NetworkGenome`].
///
/// Nodes are evaluated layer by layer starting from the inputs. Only nodes
/// that contribute to an output are evaluated; nodes that cannot be reached
/// from the inputs are skipped and read as zero.
#[derive(Debug, Clone)]
pub struct EvolvedNetwork {
    num_inputs: usize,
    output_slots: Vec<usize>,
    evals: Vec<NodeEval>,
    slots: usize,
}

impl EvolvedNetwork {
    pub fn from_genome(genome: &NetworkGenome) -> Result<Self, NetworkBuildError> {
        let mut slot_of: HashMap<NodeKey, usize> = HashMap::new();
        for i in 1..=genome.num_inputs {
            slot_of.insert(-key_of(i), i - 1);
        }
        let mut genes: HashMap<NodeKey, &NodeGene> = HashMap::new();
        for node in &genome.nodes {
            if node.key < 0 {
                return Err(NetworkBuildError::ReservedKey { key: node.key });
            }
            if genes.insert(node.key, node).is_some() {
                return Err(NetworkBuildError::DuplicateNode { key: node.key });
            }
            let slot = slot_of.len();
            slot_of.insert(node.key, slot);
        }
        let output_keys: Vec<NodeKey> = (0..genome.num_outputs).map(key_of).collect();
        if let Some(&key) = output_keys.iter().find(|key| !genes.contains_key(*key)) {
            return Err(NetworkBuildError::MissingOutput { key });
        }

        let enabled: Vec<&ConnectionGene> =
            genome.connections.iter().filter(|c| c.enabled).collect();
        for c in &enabled {
            if !slot_of.contains_key(&c.input) || !genes.contains_key(&c.output) {
                let (input, output) = (c.input, c.output);
                return Err(if c.output < 0 && slot_of.contains_key(&c.output) {
                    NetworkBuildError::IntoInput { input, output }
                } else {
                    NetworkBuildError::UnknownNode { input, output }
                });
            }
        }
        if has_cycle(&enabled) {
            return Err(NetworkBuildError::Cyclic);
        }

        let required = required_for_output(&output_keys, &enabled);
        let mut evals = vec![];
        let mut ready: HashSet<NodeKey> = (1..=genome.num_inputs).map(|i| -key_of(i)).collect();
        loop {
            let mut layer: Vec<NodeKey> = enabled
                .iter()
                .filter(|c| ready.contains(&c.input) && !ready.contains(&c.output))
                .map(|c| c.output)
                .filter(|node| required.contains(node))
                .filter(|node| {
                    enabled
                        .iter()
                        .filter(|c| c.output == *node)
                        .all(|c| ready.contains(&c.input))
                })
                .collect();
            layer.sort_unstable();
            layer.dedup();
            if layer.is_empty() {
                break;
            }
            for &key in &layer {
                let gene = genes[&key];
                evals.push(NodeEval {
                    slot: slot_of[&key],
                    bias: gene.bias,
                    response: gene.response,
                    activation: gene.activation,
                    links: enabled
                        .iter()
                        .filter(|c| c.output == key)
                        .map(|c| (slot_of[&c.input], c.weight))
                        .collect(),
                });
            }
            ready.extend(layer);
        }

        Ok(Self {
            num_inputs: genome.num_inputs,
            output_slots: output_keys.iter().map(|key| slot_of[key]).collect(),
            evals,
            slots: slot_of.len(),
        })
    }

    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Runs one forward pass and returns the output values.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` does not have [`Self::num_inputs`] values.
    #[must_use]
    pub fn activate(&self, inputs: &[f32]) -> Vec<f32> {
        assert_eq!(inputs.len(), self.num_inputs, "expected {} inputs", self.num_inputs);
        let mut values = vec![0.0; self.slots];
        values[..self.num_inputs].copy_from_slice(inputs);
        for eval in &self.evals {
            let sum: f32 = eval.links.iter().map(|&(slot, w)| values[slot] * w).sum();
            values[eval.slot] = eval.activation.apply(eval.bias + eval.response * sum);
        }
        self.output_slots.iter().map(|&slot| values[slot]).collect()
    }

    /// First output for `state`.
    #[must_use]
    pub fn score(&self, state: &[f32]) -> f32 {
        self.activate(state)[0]
    }
}

impl DecisionPolicy for EvolvedNetwork {
    fn select_best(&self, states: &[StateVector]) -> StateVector {
        let best = argmax(states.iter().map(|state| self.score(state))).unwrap_or(0);
        states[best].clone()
    }
}

/// Kahn's algorithm over the enabled connections.
fn has_cycle(connections: &[&ConnectionGene]) -> bool {
    let mut indegree: HashMap<NodeKey, usize> = HashMap::new();
    for c in connections {
        indegree.entry(c.input).or_default();
        *indegree.entry(c.output).or_default() += 1;
    }
    let mut queue: Vec<NodeKey> = indegree
        .iter()
        .filter(|&(_, &d)| d == 0)
        .map(|(&k, _)| k)
        .collect();
    let mut visited = 0;
    while let Some(node) = queue.pop() {
        visited += 1;
        for c in connections.iter().filter(|c| c.input == node) {
            let d = indegree.entry(c.output).or_default();
            *d -= 1;
            if *d == 0 {
                queue.push(c.output);
            }
        }
    }
    visited != indegree.len()
}

/// Nodes whose value can reach an output, outputs included.
fn required_for_output(outputs: &[NodeKey], connections: &[&ConnectionGene]) -> HashSet<NodeKey> {
    let mut required: HashSet<NodeKey> = outputs.iter().copied().collect();
    let mut frontier = outputs.to_vec();
    while let Some(node) = frontier.pop() {
        for c in connections.iter().filter(|c| c.output == node) {
            if c.input >= 0 && required.insert(c.input) {
                frontier.push(c.input);
            }
        }
    }
    required
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: NodeKey, bias: f32, activation: NodeActivation) -> NodeGene {
        NodeGene {
            key,
            bias,
            response: 1.0,
            activation,
        }
    }

    fn link(input: NodeKey, output: NodeKey, weight: f32) -> ConnectionGene {
        ConnectionGene {
            input,
            output,
            weight,
            enabled: true,
        }
    }

    #[test]
    fn two_layer_network_evaluates_in_order() {
        let genome = NetworkGenome {
            num_inputs: 2,
            num_outputs: 1,
            nodes: vec![
                node(0, 0.5, NodeActivation::Identity),
                node(1, 0.0, NodeActivation::Relu),
            ],
            connections: vec![link(1, 0, 2.0), link(-1, 1, 1.0), link(-2, 1, -1.0)],
        };
        let network = EvolvedNetwork::from_genome(&genome).unwrap();
        // output = 0.5 + 2 * relu(x0 - x1)
        assert_eq!(network.activate(&[3.0, 1.0]), [4.5]);
        assert_eq!(network.activate(&[1.0, 3.0]), [0.5]);
    }

    #[test]
    fn response_scales_the_weighted_sum() {
        let mut out = node(0, 1.0, NodeActivation::Identity);
        out.response = 3.0;
        let genome = NetworkGenome {
            num_inputs: 1,
            num_outputs: 1,
            nodes: vec![out],
            connections: vec![link(-1, 0, 2.0)],
        };
        let network = EvolvedNetwork::from_genome(&genome).unwrap();
        assert_eq!(network.score(&[1.5]), 1.0 + 3.0 * 3.0);
    }

    #[test]
    fn disabled_and_dangling_nodes_are_skipped() {
        let mut disabled = link(-1, 0, 10.0);
        disabled.enabled = false;
        let genome = NetworkGenome {
            num_inputs: 1,
            num_outputs: 1,
            nodes: vec![
                node(0, 0.0, NodeActivation::Identity),
                // reachable from nothing
                node(5, 7.0, NodeActivation::Identity),
            ],
            connections: vec![disabled, link(5, 0, 1.0)],
        };
        let network = EvolvedNetwork::from_genome(&genome).unwrap();
        assert_eq!(network.score(&[1.0]), 0.0);
    }

    #[test]
    fn cycles_are_rejected() {
        let genome = NetworkGenome {
            num_inputs: 1,
            num_outputs: 1,
            nodes: vec![
                node(0, 0.0, NodeActivation::Sigmoid),
                node(1, 0.0, NodeActivation::Sigmoid),
            ],
            connections: vec![link(-1, 1, 1.0), link(1, 0, 1.0), link(0, 1, 1.0)],
        };
        assert_eq!(
            EvolvedNetwork::from_genome(&genome).unwrap_err(),
            NetworkBuildError::Cyclic
        );
    }

    #[test]
    fn malformed_genomes_are_rejected() {
        let mut genome = NetworkGenome::layered(2, 1, NodeActivation::Sigmoid);
        genome.nodes.remove(0);
        assert_eq!(
            EvolvedNetwork::from_genome(&genome).unwrap_err(),
            NetworkBuildError::MissingOutput { key: 0 }
        );

        let mut genome = NetworkGenome::layered(2, 1, NodeActivation::Sigmoid);
        genome.connections.push(link(1, -2, 1.0));
        assert_eq!(
            EvolvedNetwork::from_genome(&genome).unwrap_err(),
            NetworkBuildError::IntoInput {
                input: 1,
                output: -2
            }
        );

        let mut genome = NetworkGenome::layered(2, 1, NodeActivation::Sigmoid);
        genome.connections.push(link(-9, 0, 1.0));
        assert!(matches!(
            EvolvedNetwork::from_genome(&genome),
            Err(NetworkBuildError::UnknownNode { .. })
        ));
    }

    #[test]
    fn parameters_round_trip_through_the_genome() {
        let mut genome = NetworkGenome::layered(2, 2, NodeActivation::Tanh);
        #[expect(clippy::cast_precision_loss)]
        let params: Vec<f32> = (0..genome.parameter_count()).map(|i| i as f32 * 0.1).collect();
        genome.set_parameters(&params);
        assert_eq!(genome.parameters(), params);
        assert_eq!(genome.connections[0].weight, 0.0);
        assert_eq!(genome.nodes.last().map(|n| n.bias), params.last().copied());
    }

    #[test]
    fn evolved_policy_keeps_the_first_best_state() {
        let mut genome = NetworkGenome::layered(1, 1, NodeActivation::Identity);
        genome.set_parameters(&[1.0, 1.0, 0.0, 0.0]);
        let network = EvolvedNetwork::from_genome(&genome).unwrap();
        let states = [
            StateVector::from([1.0]),
            StateVector::from([2.0]),
            StateVector::from([2.0]),
        ];
        assert_eq!(network.select_best(&states), states[1]);
    }
}
