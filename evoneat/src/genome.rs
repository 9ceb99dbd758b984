use crate::ConfigurationError;

use rand::Rng;

/// Unique identifier of a genome within a population.
///
/// Identifiers are handed out in increasing order and
/// are never reused, even after the genome dies.
pub type GenomeId = usize;

/// An interface for genomes that can be evolved by a [`Population`].
///
/// [`Population`]: crate::Population
pub trait Genome: Sized {
    type Config;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;

    /// Returns a randomized genome with the given id.
    fn new<R: Rng + ?Sized>(id: GenomeId, config: &Self::Config, rng: &mut R) -> Self;

    /// Checks that a genetic configuration is usable,
    /// before any genome is built from it.
    fn check_config(_config: &Self::Config) -> Result<(), ConfigurationError> {
        Ok(())
    }

    /// Returns whether the genome could have been
    /// produced under the given configuration.
    /// Used to vet seed genomes.
    fn conforms_to(&self, config: &Self::Config) -> bool;

    /// Returns the genome's identifier.
    fn id(&self) -> GenomeId;

    /// Returns the compatibility distance between two genomes.
    ///
    /// Must be symmetric and zero for a genome and its clone.
    fn genetic_distance(first: &Self, second: &Self, config: &Self::Config) -> f32;

    /// Combines two genomes into a mutated child with the given id.
    fn mate<R: Rng + ?Sized>(
        id: GenomeId,
        parent1: &Self,
        parent2: &Self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Returns a mutated copy of `parent` with the given id.
    fn clone_mutated<R: Rng + ?Sized>(
        id: GenomeId,
        parent: &Self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Sets the genome's fitness value.
    ///
    /// The population only ever passes finite, non-negative values.
    fn set_fitness(&mut self, fitness: f32);

    /// Returns the genome's fitness value,
    /// or `None` if it has not been evaluated.
    fn fitness(&self) -> Option<f32>;
}

/// An Innovation History is used to keep track
/// of genetic innovations throught successive
/// generations of genomes.
///
/// The population calls [`start_generation`] at the
/// beginning of every reproduction phase, so that
/// identical structural mutations are only merged
/// within the same generation.
///
/// [`start_generation`]: InnovationHistory::start_generation
pub trait InnovationHistory {
    type Config;

    fn new(config: &Self::Config) -> Self;

    fn start_generation(&mut self);
}
