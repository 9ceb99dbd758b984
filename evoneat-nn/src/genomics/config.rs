use crate::genomics::ActivationType;
use evoneat::ConfigurationError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Parameters of genome structure, mutation,
/// crossover and compatibility distance.
///
/// Every `*_chance` is a probability and must lie
/// in `[0, 1]`; weights, powers and distance factors
/// must be finite and non-negative. [`validate`]
/// checks both.
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    pub input_count: NonZeroUsize,
    pub output_count: NonZeroUsize,
    /// Activation functions drawn from for hidden nodes.
    /// Sigmoid is used when empty.
    pub activation_types: Vec<ActivationType>,
    /// Activation function of each output node, by position.
    /// Outputs without an entry use sigmoid.
    pub output_activation_types: Vec<ActivationType>,

    // Crossover.
    /// Chance a gene shared by both parents takes the mean
    /// of their weights rather than one parent's weight.
    pub mate_by_averaging_chance: f32,
    /// Chance a shared gene disabled in either parent
    /// is enabled in the child.
    pub reenable_chance: f32,
    /// Chance a gene found only in the fitter parent is
    /// inherited; genes found only in the weaker parent
    /// use `1 - noncommon_inheritance_chance`.
    pub noncommon_inheritance_chance: f32,

    // Weights.
    /// Chance each sensor-actuator gene is present
    /// in a newly created genome.
    pub initial_expression_chance: f32,
    /// Weights and biases stay within `±weight_bound`.
    pub weight_bound: f32,
    /// Chance a child's weights and biases are mutated at all.
    pub weight_mutation_chance: f32,
    /// Per weight, chance of being redrawn uniformly.
    pub weight_reset_chance: f32,
    /// Per weight not redrawn, chance of being nudged.
    pub weight_nudge_chance: f32,
    /// Largest nudge applied to a weight.
    pub weight_mutation_power: f32,

    // Structure.
    /// Chance one random gene flips its enabled flag.
    pub toggle_expression_chance: f32,
    /// Chance an enabled gene is split by a new node.
    pub node_addition_mutation_chance: f32,
    /// Chance a gene is added between unlinked nodes.
    pub gene_addition_mutation_chance: f32,
    /// Input nodes tried before gene addition gives up.
    pub max_gene_addition_mutation_attempts: usize,
    /// Chance gene addition links a node to itself,
    /// when that link is missing.
    pub recursion_chance: f32,

    // Compatibility distance.
    pub excess_gene_factor: f32,
    pub disjoint_gene_factor: f32,
    /// Factor of the mean weight difference of shared genes.
    pub common_weight_factor: f32,
}

impl GeneticConfig {
    /// A configuration with one input, one output, and
    /// every other value zero or empty. Genomes built from
    /// it never change; use it to fill in the fields an
    /// experiment leaves unset.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 3.0,
    ///     weight_mutation_chance: 0.8,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert_eq!(config.input_count.get(), 1);
    /// assert!(config.activation_types.is_empty());
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            activation_types: vec![],
            output_activation_types: vec![],
            mate_by_averaging_chance: 0.0,
            reenable_chance: 0.0,
            initial_expression_chance: 0.0,
            weight_bound: 0.0,
            weight_mutation_chance: 0.0,
            weight_reset_chance: 0.0,
            weight_nudge_chance: 0.0,
            weight_mutation_power: 0.0,
            toggle_expression_chance: 0.0,
            node_addition_mutation_chance: 0.0,
            gene_addition_mutation_chance: 0.0,
            max_gene_addition_mutation_attempts: 0,
            recursion_chance: 0.0,
            noncommon_inheritance_chance: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
        }
    }

    /// Checks that every value lies in its valid range.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::GeneticConfig;
    ///
    /// assert!(GeneticConfig::zero().validate().is_ok());
    ///
    /// let config = GeneticConfig {
    ///     reenable_chance: 1.25,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let probabilities = [
            ("mate_by_averaging_chance", self.mate_by_averaging_chance),
            ("reenable_chance", self.reenable_chance),
            ("initial_expression_chance", self.initial_expression_chance),
            ("weight_mutation_chance", self.weight_mutation_chance),
            ("weight_reset_chance", self.weight_reset_chance),
            ("weight_nudge_chance", self.weight_nudge_chance),
            ("toggle_expression_chance", self.toggle_expression_chance),
            ("node_addition_mutation_chance", self.node_addition_mutation_chance),
            ("gene_addition_mutation_chance", self.gene_addition_mutation_chance),
            ("recursion_chance", self.recursion_chance),
            ("noncommon_inheritance_chance", self.noncommon_inheritance_chance),
        ];
        for (parameter, value) in probabilities {
            ConfigurationError::check_probability(parameter, value)?;
        }

        let magnitudes = [
            ("weight_bound", self.weight_bound),
            ("weight_mutation_power", self.weight_mutation_power),
            ("excess_gene_factor", self.excess_gene_factor),
            ("disjoint_gene_factor", self.disjoint_gene_factor),
            ("common_weight_factor", self.common_weight_factor),
        ];
        for (parameter, value) in magnitudes {
            ConfigurationError::check_non_negative(parameter, value)?;
        }
        Ok(())
    }
}
