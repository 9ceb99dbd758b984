use super::{EvolutionError, PopulationConfig};
use crate::Genome;

use serde::{Deserialize, Serialize};

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
///
/// Identifiers are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// genomes. Membership is determined by calculating
/// the genetic distance to a _representative_, a copy
/// of one of the members of the previous generation.
///
/// A species does not own its members. It stores their
/// indices into the population's genome table, which
/// are recomputed from scratch every generation.
///
/// [genetic distance]: PopulationConfig::distance_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species<G> {
    id: SpeciesID,
    pub(super) members: Vec<usize>,
    pub(super) representative: G,
    pub(super) age: usize,
}

impl<G: Genome + Clone> Species<G> {
    /// Creates a new species with the specified ID and
    /// representative. `founder` is the table index of the
    /// genome the representative was copied from, and
    /// becomes the species' only member.
    ///
    /// # Examples
    /// ```
    /// use evoneat::{Species, SpeciesID};
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// let species = Species::new(
    ///     SpeciesID(1, 0),
    ///     NNGenome::new(0, &GeneticConfig::zero()),
    ///     0,
    /// );
    /// assert_eq!(species.members(), &[0]);
    /// ```
    pub fn new(id: SpeciesID, representative: G, founder: usize) -> Species<G> {
        Species {
            id,
            members: vec![founder],
            representative,
            age: 0,
        }
    }

    /// Returns the species' ID.
    ///
    /// # Examples
    /// ```
    /// use evoneat::{Species, SpeciesID};
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// let species = Species::new(
    ///     SpeciesID(1, 0),
    ///     NNGenome::new(0, &GeneticConfig::zero()),
    ///     0,
    /// );
    ///
    /// assert_eq!(species.id(), SpeciesID(1, 0));
    /// ```
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &G {
        &self.representative
    }

    /// Returns the genetic distance between the species'
    /// representative and `other`.
    ///
    /// # Examples
    /// ```
    /// use evoneat::{Species, SpeciesID};
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// let config = GeneticConfig {
    ///     disjoint_gene_factor: 1.0,
    ///     excess_gene_factor: 1.0,
    ///     common_weight_factor: 0.4,
    ///     ..GeneticConfig::zero()
    /// };
    /// let representative = NNGenome::new(0, &config);
    /// let species = Species::new(
    ///     SpeciesID(1, 0),
    ///     representative.clone(),
    ///     0,
    /// );
    ///
    /// assert_eq!(species.genetic_distance(&representative, &config), 0.0);
    /// ```
    pub fn genetic_distance(&self, other: &G, config: &G::Config) -> f32 {
        G::genetic_distance(&self.representative, other, config)
    }

    /// Returns the genome-table indices of the species' members.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the number of generations the species has existed for.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Returns the fitness of every member, in member order.
    ///
    /// Fails if a member has not been evaluated
    /// or does not exist in `genomes`.
    pub fn member_fitnesses(&self, genomes: &[G]) -> Result<Vec<f32>, EvolutionError> {
        self.members
            .iter()
            .map(|&i| {
                genomes.get(i).and_then(|g| g.fitness()).ok_or_else(|| {
                    EvolutionError::InvariantViolation(format!(
                        "member {} of species {:?} has no fitness",
                        i, self.id
                    ))
                })
            })
            .collect()
    }

    /// Returns the species' _member-count adjusted_
    /// fitness. I.e., the average of the species'
    /// evaluated genome's fitnesses, or 0 if
    /// there are none.
    pub fn adjusted_fitness(&self, genomes: &[G]) -> f32 {
        let fitnesses: Vec<f32> = self
            .members
            .iter()
            .filter_map(|&i| genomes.get(i).and_then(|g| g.fitness()))
            .collect();
        if fitnesses.is_empty() {
            0.0
        } else {
            fitnesses.iter().sum::<f32>() / fitnesses.len() as f32
        }
    }

    /// Returns the best-performing evaluated member, if any.
    pub fn champion<'a>(&self, genomes: &'a [G]) -> Option<&'a G> {
        self.members
            .iter()
            .filter_map(|&i| genomes.get(i))
            .filter(|g| g.fitness().is_some())
            .max_by(|a, b| a.fitness().unwrap_or(0.0).total_cmp(&b.fitness().unwrap_or(0.0)))
    }

    /// Sorts the members by decreasing fitness.
    /// Members with equal fitness keep their table order.
    pub(super) fn sort_members_by_decreasing_fitness(&mut self, genomes: &[G]) {
        let fitness_of = |i: &usize| genomes.get(*i).and_then(|g| g.fitness()).unwrap_or(0.0);
        self.members.sort_by(|a, b| fitness_of(b).total_cmp(&fitness_of(a)));
    }

    /// Points the representative at the member closest
    /// to the previous representative.
    pub(super) fn refresh_representative(&mut self, genomes: &[G], config: &G::Config) {
        let mut closest: Option<(usize, f32)> = None;
        for &i in &self.members {
            let distance = self.genetic_distance(&genomes[i], config);
            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((i, distance));
            }
        }
        if let Some((i, _)) = closest {
            self.representative = genomes[i].clone();
        }
    }

    pub(super) fn count_elite(&self, config: &PopulationConfig) -> usize {
        self.members.len().min(config.elitism)
    }

    pub(super) fn count_survivors(&self, config: &PopulationConfig) -> usize {
        ((self.members.len() as f32 * config.survival_threshold).ceil() as usize)
            .clamp(1, self.members.len().max(1))
    }
}
