use super::{SpeciesID, SpeciesVerdict};
use crate::Genome;

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

/// Running statistics of a population,
/// accumulated over its whole history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Statistics<G> {
    best_fitness: Vec<f32>,
    mean_fitness: Vec<f32>,
    species_fitness: BTreeMap<SpeciesID, Vec<(usize, f32)>>,
    best_genome: Option<G>,
}

impl<G: Genome + Clone> Statistics<G> {
    pub fn new() -> Statistics<G> {
        Statistics {
            best_fitness: vec![],
            mean_fitness: vec![],
            species_fitness: BTreeMap::new(),
            best_genome: None,
        }
    }

    /// Records the best and mean fitness of an evaluated
    /// genome table, and returns them. Unevaluated genomes
    /// are ignored.
    pub(super) fn record_evaluation(&mut self, genomes: &[G]) -> (f32, f32) {
        let mut best: Option<&G> = None;
        let mut sum = 0.0;
        let mut count = 0;
        for genome in genomes {
            if let Some(fitness) = genome.fitness() {
                sum += fitness;
                count += 1;
                if best.map_or(true, |b| fitness > b.fitness().unwrap_or(f32::NEG_INFINITY)) {
                    best = Some(genome);
                }
            }
        }

        let best_fitness = best.and_then(|g| g.fitness()).unwrap_or(0.0);
        let mean_fitness = if count > 0 { sum / count as f32 } else { 0.0 };
        self.best_fitness.push(best_fitness);
        self.mean_fitness.push(mean_fitness);

        if let Some(best) = best {
            let record = self
                .best_genome
                .as_ref()
                .and_then(|g| g.fitness())
                .unwrap_or(f32::NEG_INFINITY);
            if best_fitness > record {
                self.best_genome = Some(best.clone());
            }
        }

        (best_fitness, mean_fitness)
    }

    /// Appends each species' aggregated fitness to its history.
    pub(super) fn record_species(&mut self, generation: usize, verdicts: &[SpeciesVerdict]) {
        for verdict in verdicts {
            self.species_fitness
                .entry(verdict.species)
                .or_default()
                .push((generation, verdict.fitness));
        }
    }

    /// Best fitness of every evaluation, in order.
    pub fn best_fitness_history(&self) -> &[f32] {
        &self.best_fitness
    }

    /// Mean fitness of every evaluation, in order.
    pub fn mean_fitness_history(&self) -> &[f32] {
        &self.mean_fitness
    }

    /// `(generation, fitness)` pairs of a species,
    /// including species that have since died.
    pub fn species_fitness_history(&self, species: SpeciesID) -> Option<&[(usize, f32)]> {
        self.species_fitness.get(&species).map(Vec::as_slice)
    }

    /// Every species ever tracked, in ascending ID order.
    pub fn species_histories(&self) -> impl Iterator<Item = (&SpeciesID, &[(usize, f32)])> {
        self.species_fitness.iter().map(|(id, h)| (id, h.as_slice()))
    }

    /// The fittest genome ever evaluated. Earlier
    /// genomes win ties.
    pub fn best_genome(&self) -> Option<&G> {
        self.best_genome.as_ref()
    }
}

impl<G: Genome + Clone> Default for Statistics<G> {
    fn default() -> Self {
        Statistics::new()
    }
}
