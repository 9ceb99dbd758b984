//! # evoneat-nn
//! Neural network genomes for the `evoneat` engine.
//!
//! [`NNGenome`] implements `evoneat`'s `Genome` trait: nodes and
//! genes keyed by innovation number, with the structural mutations,
//! crossover and compatibility distance of NEAT. A genome's
//! phenotype is built with one of two networks:
//! - [`RealTimeNetwork`] keeps its state between activations, for
//!   control tasks with new inputs every time-step.
//! - [`FunctionApproximatorNetwork`] answers one input point at a
//!   time, for function approximation tasks.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
//! [`RealTimeNetwork`]: crate::networks::RealTimeNetwork
//! [`FunctionApproximatorNetwork`]: crate::networks::FunctionApproximatorNetwork
//!
//! # Example usage: growing a network by hand
//! ```
//! use evoneat_nn::genomics::{ActivationType, GeneticConfig, History, NNGenome};
//! use evoneat_nn::networks::FunctionApproximatorNetwork;
//! use std::num::NonZeroUsize;
//!
//! let config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     activation_types: vec![ActivationType::ReLU],
//!     initial_expression_chance: 1.0,
//!     weight_bound: 1.0,
//!     ..GeneticConfig::zero()
//! };
//! let mut history = History::new(&config);
//! let mut rng = rand::thread_rng();
//!
//! // Every sensor starts linked to the actuator.
//! let mut genome = NNGenome::new(0, &config);
//! assert_eq!(genome.genes().count(), 2);
//! assert_eq!(FunctionApproximatorNetwork::<1>::from(&genome).depth(), 1);
//!
//! // Splitting a gene inserts a hidden node on the path.
//! let (_, node, _) = genome.mutate_add_node(&mut history, &config, &mut rng).unwrap();
//! assert_eq!(node.activation_type(), ActivationType::ReLU);
//! let mut network = FunctionApproximatorNetwork::<1>::from(&genome);
//! assert_eq!(network.depth(), 2);
//!
//! let output = network.evaluate_at(&[0.5, -0.5])[0];
//! assert!((0.0..=1.0).contains(&output));
//! ```
//!
//! Evolving these genomes takes an `evoneat::Population`;
//! the `xor` binary shows a complete experiment.

pub mod genomics;
pub mod networks;

/// Innovation numbers identify genes and nodes
/// across genomes of the same population.
pub type Innovation = usize;
