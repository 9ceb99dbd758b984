//! Phenotypes: the neural networks an [`NNGenome`] encodes.
//!
//! Every node of the genome becomes a network node and every
//! enabled gene a weighted link. Disabled genes are not expressed.
//!
//! [`RealTimeNetwork`] keeps its state between activations, so it
//! suits control tasks where new inputs arrive every time-step.
//! [`FunctionApproximatorNetwork`] resets and runs just enough
//! activations for inputs to reach the outputs, so it suits
//! one-answer-per-input tasks.
mod function_approximator;

pub use function_approximator::FunctionApproximatorNetwork;

use crate::genomics::{ActivationType, NNGenome, NodeType};
use crate::Innovation;

use ahash::RandomState;

use std::collections::HashMap;
use std::fmt;

/// A weighted link towards the node at index `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Link {
    target: usize,
    weight: f32,
}

/// Position of a node type in the network layout.
fn layout_rank(node_type: NodeType) -> u8 {
    match node_type {
        NodeType::Sensor => 0,
        NodeType::Actuator => 1,
        NodeType::Neuron => 2,
    }
}

/// A recurrent neural network of arbitrary structure.
///
/// Nodes are indexed sensors first, then actuators, then
/// hidden neurons, in ascending innovation order within
/// each group. One activation moves every signal across
/// exactly one link.
#[derive(Clone, Debug)]
pub struct RealTimeNetwork {
    sensors: usize,
    actuators: usize,
    ids: Vec<Innovation>,
    biases: Vec<f32>,
    functions: Vec<ActivationType>,
    links: Vec<Vec<Link>>,
    pending: Vec<f32>,
    levels: Vec<f32>,
}

impl RealTimeNetwork {
    /// Builds the network expressed by `genome`.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::{
    ///     genomics::{GeneticConfig, NNGenome},
    ///     networks::RealTimeNetwork,
    /// };
    /// use std::num::NonZeroUsize;
    ///
    /// let genome = NNGenome::new(0, &GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// let network = RealTimeNetwork::new(&genome);
    /// assert_eq!(network.node_count(), 5);
    /// assert_eq!(network.outputs().len(), 2);
    /// ```
    pub fn new(genome: &NNGenome) -> RealTimeNetwork {
        let mut nodes: Vec<_> = genome.nodes().collect();
        nodes.sort_by_key(|n| (layout_rank(n.node_type()), n.innovation()));

        let index_of: HashMap<Innovation, usize, RandomState> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.innovation(), index))
            .collect();

        let mut links = vec![vec![]; nodes.len()];
        for gene in genome.genes().filter(|g| g.enabled()) {
            if let (Some(&source), Some(&target)) =
                (index_of.get(&gene.input()), index_of.get(&gene.output()))
            {
                links[source].push(Link {
                    target,
                    weight: gene.weight(),
                });
            }
        }

        let count_of = |node_type: NodeType| {
            nodes
                .iter()
                .filter(|n| n.node_type() == node_type)
                .count()
        };
        RealTimeNetwork {
            sensors: count_of(NodeType::Sensor),
            actuators: count_of(NodeType::Actuator),
            ids: nodes.iter().map(|n| n.innovation()).collect(),
            biases: nodes.iter().map(|n| n.bias()).collect(),
            functions: nodes.iter().map(|n| n.activation_type()).collect(),
            links,
            pending: vec![0.0; nodes.len()],
            levels: vec![0.0; nodes.len()],
        }
    }

    pub fn input_count(&self) -> usize {
        self.sensors
    }

    pub fn output_count(&self) -> usize {
        self.actuators
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Runs one time-step: every node sends its current level
    /// along its links, then every non-sensor node computes its
    /// new level from the biased sum it received.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::{
    ///     genomics::{ActivationType, GeneticConfig, NNGenome},
    ///     networks::RealTimeNetwork,
    /// };
    /// use std::num::NonZeroUsize;
    ///
    /// let mut genome = NNGenome::new(0, &GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     output_activation_types: vec![ActivationType::ReLU],
    ///     ..GeneticConfig::zero()
    /// });
    /// genome.add_gene(0, 0, 2, 2.5).unwrap();
    /// genome.add_gene(1, 1, 2, -2.5).unwrap();
    ///
    /// let mut network = RealTimeNetwork::new(&genome);
    /// network.set_inputs(&[1.0, 0.5]);
    /// network.activate();
    ///
    /// assert_eq!(network.outputs()[0], 1.25);
    /// ```
    pub fn activate(&mut self) {
        for (level, links) in self.levels.iter().zip(&self.links) {
            for link in links {
                self.pending[link.target] += level * link.weight;
            }
        }

        let sensors = self.sensors;
        let updates = self.pending[sensors..]
            .iter_mut()
            .zip(&mut self.levels[sensors..])
            .zip(self.functions[sensors..].iter().zip(&self.biases[sensors..]));
        for ((sum, level), (function, bias)) in updates {
            *level = function.apply(*sum + bias);
            *sum = 0.0;
        }
    }

    /// Resets every node to rest.
    pub fn clear_state(&mut self) {
        self.pending.iter_mut().for_each(|sum| *sum = 0.0);
        self.levels.iter_mut().for_each(|level| *level = 0.0);
    }

    /// Sets the level of each sensor node.
    ///
    /// # Panics
    /// Panics if `values` does not hold exactly
    /// one value per input.
    pub fn set_inputs(&mut self, values: &[f32]) {
        self.levels[..self.sensors].copy_from_slice(values);
    }

    /// Returns the current levels of the actuator nodes.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::{
    ///     genomics::{GeneticConfig, NNGenome},
    ///     networks::RealTimeNetwork,
    /// };
    ///
    /// let genome = NNGenome::new(0, &GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// let mut network = RealTimeNetwork::new(&genome);
    /// assert_eq!(network.outputs()[0], 0.0);
    ///
    /// network.set_inputs(&[1.0]);
    /// network.activate();
    /// assert_ne!(network.outputs()[0], 0.0);
    ///
    /// network.clear_state();
    /// assert_eq!(network.outputs()[0], 0.0);
    /// ```
    pub fn outputs(&self) -> Vec<f32> {
        self.levels[self.sensors..self.sensors + self.actuators].to_vec()
    }

    fn is_output(&self, index: usize) -> bool {
        (self.sensors..self.sensors + self.actuators).contains(&index)
    }

    fn links_from(&self, index: usize) -> &[Link] {
        &self.links[index]
    }
}

impl From<&NNGenome> for RealTimeNetwork {
    fn from(genome: &NNGenome) -> Self {
        RealTimeNetwork::new(genome)
    }
}

impl fmt::Display for RealTimeNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RealTimeNetwork ({} inputs, {} outputs, {} nodes)",
            self.sensors,
            self.actuators,
            self.ids.len()
        )?;
        for (index, links) in self.links.iter().enumerate() {
            for link in links {
                writeln!(f, "  {} -> {} ({})", self.ids[index], self.ids[link.target], link.weight)?;
            }
        }
        Ok(())
    }
}
