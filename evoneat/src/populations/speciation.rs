use super::{Species, SpeciesID};
use crate::Genome;

/// Result of partitioning a genome table into species.
#[derive(Debug, Clone)]
pub struct Speciation<G> {
    /// Every species with at least one member,
    /// in ascending ID order.
    pub species: Vec<Species<G>>,
    /// Species founded during this partition.
    pub created: Vec<SpeciesID>,
    /// Previous species left without members.
    pub discarded: Vec<SpeciesID>,
}

/// Partitions `genomes` into species.
///
/// Previous species keep their representatives but lose
/// their members. Every genome, in table order, joins the
/// first species (by ascending ID) whose representative lies
/// within `compatibility_threshold`; genomes that fit nowhere
/// found a new species `SpeciesID(generation, k)`. Species
/// that gain members then take the member closest to their
/// old representative as their new one.
///
/// # Examples
/// ```
/// use evoneat::{speciate, SpeciesID};
/// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
///
/// let config = GeneticConfig {
///     initial_expression_chance: 1.0,
///     weight_bound: 1.0,
///     common_weight_factor: 1.0,
///     ..GeneticConfig::zero()
/// };
/// let genomes: Vec<NNGenome> = (0..10).map(|id| NNGenome::new(id, &config)).collect();
///
/// // Weight differences never reach 3, so all genomes are compatible.
/// let speciation = speciate(&genomes, vec![], 3.0, &config, 0);
/// assert_eq!(speciation.created, vec![SpeciesID(0, 0)]);
/// assert_eq!(speciation.species[0].len(), 10);
/// ```
pub fn speciate<G: Genome + Clone>(
    genomes: &[G],
    mut previous: Vec<Species<G>>,
    compatibility_threshold: f32,
    genetic_config: &G::Config,
    generation: usize,
) -> Speciation<G> {
    previous.sort_by_key(|s| s.id());
    for species in &mut previous {
        species.members.clear();
    }

    let mut species = previous;
    let mut created = vec![];
    for (index, genome) in genomes.iter().enumerate() {
        match species
            .iter_mut()
            .find(|s| s.genetic_distance(genome, genetic_config) < compatibility_threshold)
        {
            Some(s) => s.members.push(index),
            None => {
                let id = SpeciesID(generation, created.len());
                created.push(id);
                species.push(Species::new(id, genome.clone(), index));
            }
        }
    }

    let mut discarded = vec![];
    species.retain(|s| {
        if s.is_empty() {
            discarded.push(s.id());
        }
        !s.is_empty()
    });

    for s in &mut species {
        if !created.contains(&s.id()) {
            s.refresh_representative(genomes, genetic_config);
            s.age += 1;
        }
    }

    Speciation {
        species,
        created,
        discarded,
    }
}
