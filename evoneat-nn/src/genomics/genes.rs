use crate::genomics::GeneticConfig;
use crate::Innovation;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Genes are the principal components of genomes.
/// They are created between two nodes, and become
/// network connections in the genome's phenotype.
///
/// A gene's identifier is its innovation number.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gene {
    id: Innovation,
    input: Innovation,
    output: Innovation,
    weight: f32,
    enabled: bool,
}

impl Gene {
    /// Returns a new _enabled_ gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(id: Innovation, input: Innovation, output: Innovation, weight: f32) -> Gene {
        Gene {
            id,
            input,
            output,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight. Uses a uniform distribution
    /// over the range ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub(super) fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f32 {
        if config.weight_bound > 0.0 {
            rng.gen_range(-config.weight_bound..=config.weight_bound)
        } else {
            0.0
        }
    }

    /// Returns `value` shifted by a uniform amount in
    /// ±[`weight_mutation_power`], clamped into ±[`weight_bound`].
    ///
    /// [`weight_mutation_power`]: crate::genomics::GeneticConfig::weight_mutation_power
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub(super) fn nudged<R: Rng + ?Sized>(value: f32, config: &GeneticConfig, rng: &mut R) -> f32 {
        let shift = if config.weight_mutation_power > 0.0 {
            rng.gen_range(-config.weight_mutation_power..=config.weight_mutation_power)
        } else {
            0.0
        };
        (value + shift).clamp(-config.weight_bound, config.weight_bound)
    }

    /// Randomizes the gene's weight. Uses a uniform
    /// distribution over the range ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{Gene, GeneticConfig};
    ///
    /// let mut gene = Gene::new(42, 3, 9, 20.0);
    ///
    /// gene.randomize_weight(&GeneticConfig {
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// }, &mut rand::thread_rng());
    ///
    /// assert!(gene.weight().abs() <= 5.0);
    /// ```
    pub fn randomize_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.weight = Self::random_weight(config, rng);
    }

    /// Nudges the gene's weight by a random amount. Uses
    /// a uniform distribution over the range ±[`weight_mutation_power`].
    /// If the weight's magnitude would exceed the [`weight_bound`],
    /// the weight is set to the maximum magnitude with the same
    /// sign.
    ///
    /// [`weight_mutation_power`]: crate::genomics::GeneticConfig::weight_mutation_power
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{Gene, GeneticConfig};
    ///
    /// let mut gene = Gene::new(42, 3, 9, 3.0);
    ///
    /// gene.nudge_weight(&GeneticConfig {
    ///     weight_mutation_power: 2.5,
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// }, &mut rand::thread_rng());
    ///
    /// assert!((gene.weight() - 3.0).abs() <= 2.5);
    /// assert!(gene.weight().abs() <= 5.0);
    /// ```
    pub fn nudge_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.weight = Self::nudged(self.weight, config, rng);
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the gene's input node's innovation number.
    pub fn input(&self) -> Innovation {
        self.input
    }

    /// Returns the gene's output node's innovation number.
    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns the gene's input and output's innovation numbers.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.endpoints(), (3, 9));
    /// ```
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, w: f32) {
        self.weight = w;
    }

    /// Returns whether the gene is expressed
    /// in the genome's phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the gene's expression status.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::Gene;
    ///
    /// let mut gene = Gene::new(42, 3, 9, 2.0);
    /// gene.set_enabled(false);
    ///
    /// assert!(!gene.enabled());
    /// ```
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.id,
            self.input,
            self.output,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn zero_bound_weights_stay_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut gene = Gene::new(0, 0, 1, 0.0);
        gene.randomize_weight(&GeneticConfig::zero(), &mut rng);
        assert_eq!(gene.weight(), 0.0);
        gene.nudge_weight(&GeneticConfig::zero(), &mut rng);
        assert_eq!(gene.weight(), 0.0);
    }

    #[test]
    fn nudge_clamps_to_bound() {
        let config = GeneticConfig {
            weight_bound: 1.0,
            weight_mutation_power: 0.5,
            ..GeneticConfig::zero()
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let value = Gene::nudged(1.0, &config, &mut rng);
            assert!((0.5..=1.0).contains(&value));
        }
    }

    #[test]
    fn disabled_genes_display_in_parentheses() {
        let mut gene = Gene::new(4, 0, 2, 1.0);
        assert_eq!(gene.to_string(), "4[0->2, 1.000]");
        gene.set_enabled(false);
        assert_eq!(gene.to_string(), "(4[0->2, 1.000])");
    }
}
