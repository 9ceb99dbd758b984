use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;

/// The function a node applies to its
/// biased input sum in a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivationType {
    // 1 / (1 + exp(-4.9x))
    Sigmoid,
    // x
    Identity,
    // 0   if x < 0
    // x   if x ≥ 0
    ReLU,
    // exp(-x²)
    Gaussian,
    // sin(πx)
    Sinusoidal,
}

impl ActivationType {
    /// Evaluates the activation function at `x`.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::ActivationType;
    ///
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationType::ReLU.apply(-3.0), 0.0);
    /// assert_eq!(ActivationType::Gaussian.apply(0.0), 1.0);
    /// ```
    pub fn apply(self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-4.9 * x).exp()),
            ActivationType::Identity => x,
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Gaussian => (-x * x).exp(),
            ActivationType::Sinusoidal => (x * std::f32::consts::PI).sin(),
        }
    }
}

/// The role of a node in a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Input nodes.
    Sensor,
    /// Hidden nodes.
    Neuron,
    /// Output nodes.
    Actuator,
}

/// A node gene. Genes link nodes, and each node
/// records which genes enter and leave it.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: Innovation,
    inputs: HashSet<Innovation, RandomState>,
    outputs: HashSet<Innovation, RandomState>,
    node_type: NodeType,
    activation_type: ActivationType,
    bias: f32,
}

impl Node {
    /// Creates an unlinked node with zero bias.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{Node, NodeType, ActivationType};
    ///
    /// let node = Node::new(5, NodeType::Neuron, ActivationType::Sigmoid);
    ///
    /// assert_eq!(node.innovation(), 5);
    /// assert_eq!(node.node_type(), NodeType::Neuron);
    /// assert_eq!(node.activation_type(), ActivationType::Sigmoid);
    /// assert_eq!(node.bias(), 0.0);
    /// ```
    pub fn new(id: Innovation, node_type: NodeType, activation_type: ActivationType) -> Node {
        Node {
            id,
            inputs: HashSet::default(),
            outputs: HashSet::default(),
            node_type,
            activation_type,
            bias: 0.0,
        }
    }

    /// Copies the node, dropping its links.
    pub(super) fn unlinked(&self) -> Node {
        Node {
            inputs: HashSet::default(),
            outputs: HashSet::default(),
            ..*self
        }
    }

    /// Records `gene_id` as entering the node.
    /// Returns whether it was new.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{Node, NodeType, ActivationType};
    ///
    /// let mut node = Node::new(5, NodeType::Neuron, ActivationType::Sigmoid);
    ///
    /// assert!(node.add_input_gene(9));
    /// assert_eq!(*node.input_genes().next().unwrap(), 9);
    ///
    /// assert!(!node.add_input_gene(9));
    /// ```
    pub fn add_input_gene(&mut self, gene_id: Innovation) -> bool {
        self.inputs.insert(gene_id)
    }

    /// Records `gene_id` as leaving the node.
    /// Returns whether it was new.
    pub fn add_output_gene(&mut self, gene_id: Innovation) -> bool {
        self.outputs.insert(gene_id)
    }

    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Genes entering the node, in no particular order.
    pub fn input_genes(&self) -> impl Iterator<Item = &Innovation> {
        self.inputs.iter()
    }

    /// Genes leaving the node, in no particular order.
    pub fn output_genes(&self) -> impl Iterator<Item = &Innovation> {
        self.outputs.iter()
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn activation_type(&self) -> ActivationType {
        self.activation_type
    }

    /// Returns the constant added to the node's
    /// weighted input sum. Sensors are never biased.
    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias;
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut inputs: Vec<_> = self.inputs.iter().collect();
        let mut outputs: Vec<_> = self.outputs.iter().collect();
        inputs.sort_unstable();
        outputs.sort_unstable();
        write!(
            f,
            "{:?}[{:?}, {:?}, {:.3}, IN: {:?}, OUT: {:?}]",
            self.id, self.node_type, self.activation_type, self.bias, inputs, outputs,
        )
    }
}
