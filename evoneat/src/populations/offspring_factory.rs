use super::{PopulationConfig, Species};
use crate::{Genome, GenomeId};

use rand::Rng;
use tracing::debug;

/// Distributes `total` offspring among species.
///
/// Every species is first granted a floor of
/// `min(min_species_size, total / species_count)`. The
/// rest is shared in proportion to the species' adjusted
/// fitnesses (negative values count as 0), or equally if
/// they sum to 0. Whatever integer truncation leaves over
/// goes to the fittest species, the first one on ties.
/// The allotments always add up to `total`.
pub(super) fn allot_offspring(
    adjusted_fitnesses: &[f32],
    total: usize,
    min_species_size: usize,
) -> Vec<usize> {
    let species_count = adjusted_fitnesses.len();
    if species_count == 0 {
        return vec![];
    }

    let floor = min_species_size.min(total / species_count);
    let shared = total - floor * species_count;
    let fitnesses: Vec<f32> = adjusted_fitnesses.iter().map(|f| f.max(0.0)).collect();
    let fitness_sum: f32 = fitnesses.iter().sum();

    let mut allotted: Vec<usize> = fitnesses
        .iter()
        .map(|&f| {
            let share = if fitness_sum > 0.0 {
                f / fitness_sum
            } else {
                1.0 / species_count as f32
            };
            floor + (share * shared as f32).floor() as usize
        })
        .collect();

    // Float rounding may overshoot by a unit; take it back from
    // the largest allotments above the floor.
    while allotted.iter().sum::<usize>() > total {
        if let Some(largest) = allotted.iter_mut().filter(|a| **a > floor).max() {
            *largest -= 1;
        }
    }

    let remainder = total - allotted.iter().sum::<usize>();
    let fittest = fitnesses
        .iter()
        .enumerate()
        .fold(0, |best, (i, f)| if *f > fitnesses[best] { i } else { best });
    allotted[fittest] += remainder;

    allotted
}

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs
/// and allotted offspring.
pub(super) struct OffspringFactory<'a, G: Genome, R> {
    species: &'a [Species<G>],
    genomes: &'a [G],
    history: &'a mut G::InnovationHistory,
    genetic_config: &'a G::Config,
    population_config: &'a PopulationConfig,
    rng: &'a mut R,
    next_genome_id: &'a mut GenomeId,
}

impl<'a, G: Genome + Clone, R: Rng> OffspringFactory<'a, G, R> {
    pub(super) fn new(
        species: &'a [Species<G>],
        genomes: &'a [G],
        history: &'a mut G::InnovationHistory,
        genetic_config: &'a G::Config,
        population_config: &'a PopulationConfig,
        rng: &'a mut R,
        next_genome_id: &'a mut GenomeId,
    ) -> OffspringFactory<'a, G, R> {
        OffspringFactory {
            species,
            genomes,
            history,
            genetic_config,
            population_config,
            rng,
            next_genome_id,
        }
    }

    /// Generate the allotted offspring, grouped by the
    /// species that produced them.
    ///
    /// Species members must be sorted by decreasing fitness.
    pub(super) fn generate_offspring(&mut self, allotted_offspring: &[usize]) -> Vec<Vec<G>> {
        let all_species = self.species;
        all_species
            .iter()
            .zip(allotted_offspring)
            .enumerate()
            .map(|(species_index, (species, &allotted))| {
                let elite = species.count_elite(self.population_config).min(allotted);
                let mut offspring = Vec::with_capacity(allotted);
                offspring.extend(
                    species.members[..elite]
                        .iter()
                        .map(|&i| self.genomes[i].clone()),
                );
                self.add_bred_offspring(species_index, allotted - elite, &mut offspring);
                debug!(
                    species = ?species.id(),
                    allotted,
                    elite,
                    "species offspring generated"
                );
                offspring
            })
            .collect()
    }

    /// Breed `count` children from the species' eligible
    /// parents, by crossover or by mutating a copy of a
    /// single parent.
    fn add_bred_offspring(&mut self, species_index: usize, count: usize, offspring: &mut Vec<G>) {
        let genomes = self.genomes;
        let parents = self.eligible_parents(species_index);

        for _ in 0..count {
            let id = self.allocate_id();
            let child = if parents.len() > 1
                && self.rng.gen::<f32>() < self.population_config.sexual_reproduction_chance
            {
                let (parent1, parent2) = self.choose_mates(species_index);
                G::mate(
                    id,
                    parent1,
                    parent2,
                    &mut *self.history,
                    self.genetic_config,
                    &mut *self.rng,
                )
            } else {
                let parent = &genomes[parents[self.rng.gen_range(0..parents.len())]];
                G::clone_mutated(
                    id,
                    parent,
                    &mut *self.history,
                    self.genetic_config,
                    &mut *self.rng,
                )
            };
            offspring.push(child);
        }
    }

    /// Choose two distinct parents from the species,
    /// or the second from another, randomly selected one.
    fn choose_mates(&mut self, species_index: usize) -> (&'a G, &'a G) {
        let genomes = self.genomes;
        let parents = self.eligible_parents(species_index);
        let first = self.rng.gen_range(0..parents.len());

        if self.species.len() > 1
            && self.rng.gen::<f32>() < self.population_config.interspecies_mating_chance
        {
            let mut other_index = self.rng.gen_range(0..self.species.len() - 1);
            if other_index >= species_index {
                other_index += 1;
            }
            let others = self.eligible_parents(other_index);
            let second = others[self.rng.gen_range(0..others.len())];
            (&genomes[parents[first]], &genomes[second])
        } else {
            let mut second = self.rng.gen_range(0..parents.len() - 1);
            if second >= first {
                second += 1;
            }
            (&genomes[parents[first]], &genomes[parents[second]])
        }
    }

    /// Returns the table indices of the top surviving
    /// members of a species.
    fn eligible_parents(&self, species_index: usize) -> &'a [usize] {
        let species: &'a Species<G> = &self.species[species_index];
        &species.members[..species.count_survivors(self.population_config)]
    }

    fn allocate_id(&mut self) -> GenomeId {
        let id = *self.next_genome_id;
        *self.next_genome_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PointConfig, PointGenome, PointHistory};
    use crate::SpeciesID;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use std::collections::HashSet;

    const CONFIG: PointConfig = PointConfig {
        spread: 1.0,
        step: 0.25,
    };

    fn species_with(id: SpeciesID, members: &[usize], genomes: &[PointGenome]) -> Species<PointGenome> {
        let mut species = Species::new(id, genomes[members[0]].clone(), members[0]);
        species.members = members.to_vec();
        species.sort_members_by_decreasing_fitness(genomes);
        species
    }

    #[test]
    fn allotments_sum_to_total() {
        for (fitnesses, total) in [
            (vec![1.0, 1.0, 1.0], 10),
            (vec![0.3, 5.7, 2.2, 9.1], 97),
            (vec![0.0, 0.0], 7),
            (vec![1e-6, 1e6, 3.0], 150),
            (vec![4.0], 1),
        ] {
            let allotted = allot_offspring(&fitnesses, total, 2);
            assert_eq!(allotted.iter().sum::<usize>(), total, "{:?}", fitnesses);
        }
    }

    #[test]
    fn allotment_is_proportional_with_remainder_to_fittest() {
        assert_eq!(allot_offspring(&[1.0, 2.0, 1.0], 10, 0), vec![2, 6, 2]);
        // Ties go to the first species.
        assert_eq!(allot_offspring(&[3.0, 3.0], 5, 0), vec![3, 2]);
    }

    #[test]
    fn allotment_grants_floor_to_weak_species() {
        assert_eq!(allot_offspring(&[0.0, 10.0], 20, 3), vec![3, 17]);
        // The floor shrinks when the population cannot afford it.
        assert_eq!(allot_offspring(&[0.0, 0.0, 10.0], 4, 3), vec![1, 1, 2]);
    }

    #[test]
    fn zero_fitness_species_share_equally() {
        assert_eq!(allot_offspring(&[0.0, -2.0, 0.0], 9, 0), vec![3, 3, 3]);
    }

    #[test]
    fn single_parent_species_fills_its_allotment() {
        let genomes = vec![PointGenome::evaluated(0, 0.5, 1.0)];
        let species = vec![species_with(SpeciesID(0, 0), &[0], &genomes)];
        let config = PopulationConfig {
            sexual_reproduction_chance: 1.0,
            ..PopulationConfig::zero()
        };
        let mut history = PointHistory::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut next_id = 1;

        let offspring = OffspringFactory::new(
            &species,
            &genomes,
            &mut history,
            &CONFIG,
            &config,
            &mut rng,
            &mut next_id,
        )
        .generate_offspring(&[5]);

        let ids: HashSet<_> = offspring[0].iter().map(|g| g.id).collect();
        assert_eq!(offspring[0].len(), 5);
        assert_eq!(ids.len(), 5);
        assert!(!ids.contains(&0));
        assert_eq!(next_id, 6);
        assert!(offspring[0].iter().all(|g| g.value == 0.75 && g.fitness.is_none()));
    }

    #[test]
    fn elites_are_carried_over_unchanged() {
        let genomes = vec![
            PointGenome::evaluated(0, 0.0, 1.0),
            PointGenome::evaluated(1, 0.1, 9.0),
            PointGenome::evaluated(2, 0.2, 5.0),
        ];
        let species = vec![species_with(SpeciesID(0, 0), &[0, 1, 2], &genomes)];
        let config = PopulationConfig {
            elitism: 2,
            survival_threshold: 0.5,
            sexual_reproduction_chance: 0.5,
            ..PopulationConfig::zero()
        };
        let mut history = PointHistory::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut next_id = 3;

        let offspring = OffspringFactory::new(
            &species,
            &genomes,
            &mut history,
            &CONFIG,
            &config,
            &mut rng,
            &mut next_id,
        )
        .generate_offspring(&[4]);

        assert_eq!(&offspring[0][..2], &[genomes[1].clone(), genomes[2].clone()]);
        assert!(offspring[0][2..].iter().all(|g| g.id >= 3));
    }

    #[test]
    fn elitism_is_bounded_by_allotment() {
        let genomes = vec![
            PointGenome::evaluated(0, 0.0, 1.0),
            PointGenome::evaluated(1, 0.0, 2.0),
        ];
        let species = vec![
            species_with(SpeciesID(0, 0), &[0], &genomes),
            species_with(SpeciesID(0, 1), &[1], &genomes),
        ];
        let config = PopulationConfig {
            elitism: 3,
            ..PopulationConfig::zero()
        };
        let mut history = PointHistory::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut next_id = 2;

        let offspring = OffspringFactory::new(
            &species,
            &genomes,
            &mut history,
            &CONFIG,
            &config,
            &mut rng,
            &mut next_id,
        )
        .generate_offspring(&[0, 2]);

        assert!(offspring[0].is_empty());
        assert_eq!(offspring[1][0], genomes[1]);
        assert_eq!(offspring[1][1].id, 2);
    }

    #[test]
    fn crossover_uses_distinct_parents() {
        let genomes = vec![
            PointGenome::evaluated(0, 0.0, 2.0),
            PointGenome::evaluated(1, 1.0, 1.0),
        ];
        let species = vec![species_with(SpeciesID(0, 0), &[0, 1], &genomes)];
        let config = PopulationConfig {
            sexual_reproduction_chance: 1.0,
            ..PopulationConfig::zero()
        };
        let mut history = PointHistory::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut next_id = 2;

        let offspring = OffspringFactory::new(
            &species,
            &genomes,
            &mut history,
            &CONFIG,
            &config,
            &mut rng,
            &mut next_id,
        )
        .generate_offspring(&[6]);

        // Mating two different points always lands on their midpoint.
        assert!(offspring[0].iter().all(|g| g.value == 0.75));
    }

    #[test]
    fn interspecies_mating_takes_a_parent_from_another_species() {
        let genomes = vec![
            PointGenome::evaluated(0, 0.0, 2.0),
            PointGenome::evaluated(1, 1.0, 1.0),
            PointGenome::evaluated(2, 10.0, 2.0),
            PointGenome::evaluated(3, 11.0, 1.0),
        ];
        let species = vec![
            species_with(SpeciesID(0, 0), &[0, 1], &genomes),
            species_with(SpeciesID(0, 1), &[2, 3], &genomes),
        ];
        let config = PopulationConfig {
            survival_threshold: 1.0,
            sexual_reproduction_chance: 1.0,
            interspecies_mating_chance: 1.0,
            ..PopulationConfig::zero()
        };
        let mut history = PointHistory::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut next_id = 4;

        let offspring = OffspringFactory::new(
            &species,
            &genomes,
            &mut history,
            &CONFIG,
            &config,
            &mut rng,
            &mut next_id,
        )
        .generate_offspring(&[8, 8]);

        // Pairs within a species land near 0.75 or 10.75;
        // pairs across species land between 5.25 and 6.25.
        for child in offspring.iter().flatten() {
            assert!((5.25..=6.25).contains(&child.value), "{:?}", child);
        }
        assert_eq!(offspring.iter().flatten().count(), 16);
    }
}
