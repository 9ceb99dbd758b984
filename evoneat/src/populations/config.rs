use super::{ConfigurationError, SpeciesFitnessFunc};

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Values outside
/// of their range are rejected by [`validate`] before
/// a population is built.
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Genetic distance threshold, at or beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub distance_threshold: f32,
    /// Top n of each species which is copied
    /// as-is to the next generation.
    pub elitism: usize,
    /// Top fraction of each species which can participate
    /// in mating. Must be in (0, 1].
    pub survival_threshold: f32,
    /// Chance that offspring will be the result
    /// of sexual reproduction (as opposed to asexual).
    pub sexual_reproduction_chance: f32,
    /// Chance that genomes from different species
    /// will be selected to mate.
    pub interspecies_mating_chance: f32,
    /// Minimum number of offspring allotted to
    /// every surviving species, as long as the
    /// population is large enough to grant it.
    pub min_species_size: usize,
    /// Number of generations without a fitness increase
    /// before a species is considered _stagnated_.
    pub max_stagnation: NonZeroUsize,
    /// Aggregate used to summarize a species' member
    /// fitnesses when tracking stagnation.
    pub species_fitness_func: SpeciesFitnessFunc,
    /// Number of top-fitness species protected
    /// from removal for stagnation.
    pub species_elitism: usize,
    /// Fitness at which [`epoch`] stops early.
    ///
    /// [`epoch`]: crate::Population::epoch
    pub fitness_threshold: Option<f32>,
    /// Seed for the population's random number generator.
    /// Runs with equal seeds and configurations are reproducible.
    pub seed: Option<u64>,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1. The survival threshold is 1,
    /// the species fitness function is `max`.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use evoneat::PopulationConfig;
    ///
    /// let cfg1 = PopulationConfig::zero();
    ///
    /// let cfg2 = PopulationConfig {
    ///     // Specify some values here...
    ///     species_elitism: 2,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            distance_threshold: 0.0,
            elitism: 0,
            survival_threshold: 1.0,
            sexual_reproduction_chance: 0.0,
            interspecies_mating_chance: 0.0,
            min_species_size: 0,
            max_stagnation: NonZeroUsize::MIN,
            species_fitness_func: SpeciesFitnessFunc::Max,
            species_elitism: 0,
            fitness_threshold: None,
            seed: None,
        }
    }

    /// Checks that every value lies in its valid range.
    ///
    /// # Examples
    /// ```
    /// use evoneat::PopulationConfig;
    ///
    /// assert!(PopulationConfig::zero().validate().is_ok());
    ///
    /// let config = PopulationConfig {
    ///     survival_threshold: 0.0,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ConfigurationError::check_non_negative("distance_threshold", self.distance_threshold)?;
        if !(self.survival_threshold > 0.0 && self.survival_threshold <= 1.0) {
            return Err(ConfigurationError::OutOfRange {
                parameter: "survival_threshold",
                value: self.survival_threshold as f64,
                expected: "a fraction in (0, 1]",
            });
        }
        ConfigurationError::check_probability(
            "sexual_reproduction_chance",
            self.sexual_reproduction_chance,
        )?;
        ConfigurationError::check_probability(
            "interspecies_mating_chance",
            self.interspecies_mating_chance,
        )?;
        if let Some(threshold) = self.fitness_threshold {
            if threshold.is_nan() {
                return Err(ConfigurationError::OutOfRange {
                    parameter: "fitness_threshold",
                    value: threshold as f64,
                    expected: "a number",
                });
            }
        }
        Ok(())
    }
}
